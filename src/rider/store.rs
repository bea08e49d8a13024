//! Rider (courier) store, grounded on `database/rider_db.go`. The
//! candidate query here is the C1 half of C4's nearest-courier search —
//! only `online` riders are returned; Haversine filtering and ranking
//! happens in `dispatch::geo`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core_types::RiderId;
use crate::order::error::OrderError;
use crate::rider::model::{Rider, RiderStatus};

#[async_trait]
pub trait RiderStore: Send + Sync {
    async fn get(&self, rider_id: RiderId) -> Result<Rider, OrderError>;

    /// Every online rider, for the dispatch candidate query to filter by
    /// distance in-process (a dedicated PostGIS-style bounding query is a
    /// documented future optimization, not required at this scale).
    async fn list_online(&self) -> Result<Vec<Rider>, OrderError>;

    async fn set_status(&self, rider_id: RiderId, status: RiderStatus) -> Result<(), OrderError>;
}

pub struct PgRiderStore {
    pool: PgPool,
}

impl PgRiderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_str(status: RiderStatus) -> &'static str {
    match status {
        RiderStatus::Online => "online",
        RiderStatus::Busy => "busy",
        RiderStatus::Offline => "offline",
    }
}

fn status_from_str(s: &str) -> RiderStatus {
    match s {
        "online" => RiderStatus::Online,
        "busy" => RiderStatus::Busy,
        _ => RiderStatus::Offline,
    }
}

#[async_trait]
impl RiderStore for PgRiderStore {
    async fn get(&self, rider_id: RiderId) -> Result<Rider, OrderError> {
        let row = sqlx::query(
            "SELECT id, status, lat, lng, delivery_fee, rating FROM riders WHERE id = $1",
        )
        .bind(rider_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let status: String = row.try_get("status")?;
                Ok(Rider {
                    id: row.try_get("id")?,
                    status: status_from_str(&status),
                    lat: row.try_get("lat")?,
                    lng: row.try_get("lng")?,
                    delivery_fee: row.try_get("delivery_fee")?,
                    rating: row.try_get("rating")?,
                })
            }
            None => Err(OrderError::NotFound(rider_id)),
        }
    }

    async fn list_online(&self) -> Result<Vec<Rider>, OrderError> {
        let rows = sqlx::query(
            "SELECT id, status, lat, lng, delivery_fee, rating FROM riders WHERE status = 'online'",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(Rider {
                    id: row.try_get("id")?,
                    status: status_from_str(&status),
                    lat: row.try_get("lat")?,
                    lng: row.try_get("lng")?,
                    delivery_fee: row.try_get("delivery_fee")?,
                    rating: row.try_get("rating")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(OrderError::from)
    }

    async fn set_status(&self, rider_id: RiderId, status: RiderStatus) -> Result<(), OrderError> {
        sqlx::query("UPDATE riders SET status = $1 WHERE id = $2")
            .bind(status_str(status))
            .bind(rider_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory fake for tests.
pub struct FakeRiderStore {
    riders: Mutex<HashMap<RiderId, Rider>>,
}

impl FakeRiderStore {
    pub fn new() -> Self {
        Self {
            riders: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, rider: Rider) {
        self.riders.lock().unwrap().insert(rider.id, rider);
    }
}

impl Default for FakeRiderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiderStore for FakeRiderStore {
    async fn get(&self, rider_id: RiderId) -> Result<Rider, OrderError> {
        self.riders
            .lock()
            .unwrap()
            .get(&rider_id)
            .cloned()
            .ok_or(OrderError::NotFound(rider_id))
    }

    async fn list_online(&self) -> Result<Vec<Rider>, OrderError> {
        Ok(self
            .riders
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.status == RiderStatus::Online)
            .cloned()
            .collect())
    }

    async fn set_status(&self, rider_id: RiderId, status: RiderStatus) -> Result<(), OrderError> {
        let mut riders = self.riders.lock().unwrap();
        if let Some(rider) = riders.get_mut(&rider_id) {
            rider.status = status;
        }
        Ok(())
    }
}
