//! Product inventory store. The conditional-update reservation path
//! (`UPDATE ... WHERE stock >= qty`) is the regular-order half of C8; see
//! `reservation.rs` for the cache-scripted flash-sale half.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core_types::ProductId;
use crate::product::error::StockError;
use crate::product::model::Product;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, product_id: ProductId) -> Result<Product, StockError>;

    /// Atomically deduct `qty` iff enough stock remains. Never a
    /// read-modify-write pair (spec.md §9 redesign flag on scripted
    /// atomicity) — a single conditional `UPDATE`.
    async fn reserve(&self, product_id: ProductId, qty: i32) -> Result<(), StockError>;

    /// Compensating increment for a reservation whose order never committed.
    async fn release(&self, product_id: ProductId, qty: i32) -> Result<(), StockError>;
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn get(&self, product_id: ProductId) -> Result<Product, StockError> {
        let row = sqlx::query(
            "SELECT id, shop_id, name, price, stock, is_flash_sale FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Product {
                id: row.try_get("id")?,
                shop_id: row.try_get("shop_id")?,
                name: row.try_get("name")?,
                price: row.try_get("price")?,
                stock: row.try_get("stock")?,
                is_flash_sale: row.try_get("is_flash_sale")?,
            }),
            None => Err(StockError::NotFound(product_id)),
        }
    }

    async fn reserve(&self, product_id: ProductId, qty: i32) -> Result<(), StockError> {
        let result = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
            .bind(qty)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StockError::Insufficient {
                product_id,
                requested: qty,
            });
        }
        Ok(())
    }

    async fn release(&self, product_id: ProductId, qty: i32) -> Result<(), StockError> {
        sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
            .bind(qty)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory fake for tests.
pub struct FakeProductStore {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl FakeProductStore {
    pub fn new() -> Self {
        Self {
            products: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }
}

impl Default for FakeProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for FakeProductStore {
    async fn get(&self, product_id: ProductId) -> Result<Product, StockError> {
        self.products
            .lock()
            .unwrap()
            .get(&product_id)
            .cloned()
            .ok_or(StockError::NotFound(product_id))
    }

    async fn reserve(&self, product_id: ProductId, qty: i32) -> Result<(), StockError> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .get_mut(&product_id)
            .ok_or(StockError::NotFound(product_id))?;
        if product.stock < qty {
            return Err(StockError::Insufficient {
                product_id,
                requested: qty,
            });
        }
        product.stock -= qty;
        Ok(())
    }

    async fn release(&self, product_id: ProductId, qty: i32) -> Result<(), StockError> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .get_mut(&product_id)
            .ok_or(StockError::NotFound(product_id))?;
        product.stock += qty;
        Ok(())
    }
}
