use serde::{Deserialize, Serialize};

use crate::core_types::{Money, ShopId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Fixed at order creation per-shop delivery fee (spec.md §9 Open
    /// Question, resolved in DESIGN.md: fixed at creation, not recomputed
    /// on courier assignment).
    pub delivery_fee: Money,
}
