use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core_types::ShopId;
use crate::order::error::OrderError;
use crate::shop::model::Shop;

#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn get(&self, shop_id: ShopId) -> Result<Shop, OrderError>;
}

pub struct PgShopStore {
    pool: PgPool,
}

impl PgShopStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for PgShopStore {
    async fn get(&self, shop_id: ShopId) -> Result<Shop, OrderError> {
        let row = sqlx::query("SELECT id, name, lat, lng, delivery_fee FROM shops WHERE id = $1")
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Shop {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                lat: row.try_get("lat")?,
                lng: row.try_get("lng")?,
                delivery_fee: row.try_get("delivery_fee")?,
            }),
            None => Err(OrderError::NotFound(shop_id)),
        }
    }
}

/// In-memory fake for tests.
pub struct FakeShopStore {
    shops: Mutex<HashMap<ShopId, Shop>>,
}

impl FakeShopStore {
    pub fn new() -> Self {
        Self {
            shops: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, shop: Shop) {
        self.shops.lock().unwrap().insert(shop.id, shop);
    }
}

impl Default for FakeShopStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShopStore for FakeShopStore {
    async fn get(&self, shop_id: ShopId) -> Result<Shop, OrderError> {
        self.shops
            .lock()
            .unwrap()
            .get(&shop_id)
            .cloned()
            .ok_or(OrderError::NotFound(shop_id))
    }
}
