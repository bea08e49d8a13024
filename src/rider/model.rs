use serde::{Deserialize, Serialize};

use crate::core_types::{Money, RiderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    Online,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    pub status: RiderStatus,
    pub lat: f64,
    pub lng: f64,
    pub delivery_fee: Money,
    pub rating: f64,
}
