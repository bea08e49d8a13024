//! Order state-machine failure taxonomy (spec.md §4.1), grounded on
//! `transfer::error::TransferError`.

use thiserror::Error;

use crate::core_types::{OrderId, ProductId};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {order_id} cannot accept this event in status {from}")]
    IllegalTransition {
        order_id: OrderId,
        from: &'static str,
    },

    #[error("actor {actor_id} is not authorized for order {order_id}")]
    OwnershipViolation { order_id: OrderId, actor_id: i64 },

    #[error("order {0} was already claimed by a concurrent actor")]
    Conflict(OrderId),

    #[error("product {0} has insufficient stock for this order")]
    OutOfStock(ProductId),

    #[error("transient storage failure: {0}")]
    TransientStorage(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::TransientStorage(err.to_string())
    }
}
