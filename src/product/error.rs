use thiserror::Error;

use crate::core_types::ProductId;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("product {product_id} has insufficient stock for quantity {requested}")]
    Insufficient { product_id: ProductId, requested: i32 },

    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error("transient storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        StockError::Storage(err.to_string())
    }
}

impl From<crate::cache::CacheError> for StockError {
    fn from(err: crate::cache::CacheError) -> Self {
        StockError::Storage(err.to_string())
    }
}
