//! Order entity (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::{Money, OrderId, ProductId, RiderId, ShopId, UserId};
use crate::order::status::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub rider_id: Option<RiderId>,
    pub product_id: ProductId,
    pub quantity: i32,
    pub status: OrderStatus,
    pub total_price: Money,
    pub delivery_fee: Money,
    pub created_at: DateTime<Utc>,
    pub group_id: Option<i64>,
}

impl Order {
    /// `total_price = unit_price * quantity + delivery_fee`, fixed at
    /// creation (spec.md §3, §9 Open Question resolved in DESIGN.md).
    pub fn compute_total(unit_price: Money, quantity: i32, delivery_fee: Money) -> Money {
        unit_price * Money::from(quantity) + delivery_fee
    }
}
