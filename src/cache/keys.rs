//! Cache keyspace and bus channel names (spec.md §6).

use crate::core_types::{GroupId, OrderId, ProductId, RiderId};

pub fn order_status_key(order_id: OrderId) -> String {
    format!("order_status_{order_id}")
}

pub fn seckill_stock_key(product_id: ProductId) -> String {
    format!("seckill:{product_id}")
}

pub fn group_key(group_id: GroupId) -> String {
    format!("group:{group_id}")
}

pub fn rider_channel(rider_id: RiderId) -> String {
    format!("rider_{rider_id}")
}

/// Channel a newly placed order is published to for the merchant-facing
/// consumer.
pub const ORDER_CHANNEL: &str = "order_channel";

/// List key courier clients pull published delivery orders from when no
/// push offer was accepted (the pull-phase fallback, spec.md §4.2).
pub const PUBLIC_HALL: &str = "public_hall";
