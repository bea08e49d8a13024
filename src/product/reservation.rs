//! Stock Reservation (C8): pre-deduct on order placement, compensating
//! increment on failure. Regular products reserve synchronously against
//! the store (`ProductStore::reserve`); flash-sale products reserve
//! against the cache counter via a single atomic script, grounded on
//! `database/product_db.go`'s `PreReduceSeckillStock`/`RollbackSeckillStock`.

use std::sync::Arc;

use crate::cache::Cache;
use crate::cache::keys::seckill_stock_key;
use crate::core_types::ProductId;
use crate::product::error::StockError;
use crate::product::model::Product;
use crate::product::store::ProductStore;

pub struct StockReservation {
    store: Arc<dyn ProductStore>,
    cache: Arc<Cache>,
}

impl StockReservation {
    pub fn new(store: Arc<dyn ProductStore>, cache: Arc<Cache>) -> Self {
        Self { store, cache }
    }

    /// Reserve `qty` units of `product`. For flash-sale products this only
    /// supports qty=1 per call, matching the source's seckill semantics
    /// (one atomic `DECR` per reservation attempt).
    pub async fn reserve(&self, product: &Product, qty: i32) -> Result<(), StockError> {
        if product.is_flash_sale {
            if qty != 1 {
                return Err(StockError::Insufficient {
                    product_id: product.id,
                    requested: qty,
                });
            }
            let key = seckill_stock_key(product.id);
            let ok = self.cache.decr_if_positive(&key).await?;
            if !ok {
                return Err(StockError::Insufficient {
                    product_id: product.id,
                    requested: qty,
                });
            }
            Ok(())
        } else {
            self.store.reserve(product.id, qty).await
        }
    }

    /// Compensating release for a reservation whose order creation failed
    /// downstream of the reserve call.
    pub async fn release(&self, product: &Product, qty: i32) -> Result<(), StockError> {
        if product.is_flash_sale {
            let key = seckill_stock_key(product.id);
            self.cache.incr(&key).await?;
            Ok(())
        } else {
            self.store.release(product.id, qty).await
        }
    }

    /// Initializes the cache counter from authoritative stock at the start
    /// of a flash-sale activity window.
    pub async fn activate(&self, product_id: ProductId, seckill_stock: i64) -> Result<(), StockError> {
        let key = seckill_stock_key(product_id);
        self.cache.set_counter(&key, seckill_stock).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::store::FakeProductStore;

    fn regular_product(id: ProductId, stock: i32) -> Product {
        Product {
            id,
            shop_id: 1,
            name: "test".into(),
            price: crate::core_types::Money::new(1500, 2),
            stock,
            is_flash_sale: false,
        }
    }

    #[tokio::test]
    async fn regular_reservation_reduces_stock() {
        let fake = FakeProductStore::new();
        fake.seed(regular_product(1, 10));
        fake.reserve(1, 3).await.unwrap();
        assert_eq!(fake.get(1).await.unwrap().stock, 7);
    }

    #[tokio::test]
    async fn regular_reservation_fails_when_insufficient() {
        let fake = FakeProductStore::new();
        fake.seed(regular_product(1, 1));
        let err = fake.reserve(1, 2).await.unwrap_err();
        assert!(matches!(err, StockError::Insufficient { .. }));
    }
}
