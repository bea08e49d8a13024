//! HTTP request/response bodies (spec.md §6). Every body is a concrete
//! `serde`-derived struct — no untyped JSON maps, per the redesign flag in
//! spec.md §9 on loose event-payload typing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::Role;
use crate::core_types::{GroupId, MessageId, Money, OrderId, ProductId, RiderId, ShopId, UserId};
use crate::message::SenderRole;
use crate::order::OrderStatus;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlaceOrderRequest {
    pub product_id: ProductId,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
    pub total_price: Money,
    #[schema(value_type = String)]
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderIdQuery {
    pub order_id: OrderId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusResponse {
    pub order_id: OrderId,
    #[schema(value_type = String)]
    pub status: OrderStatus,
    pub rider_id: Option<RiderId>,
    pub group_id: Option<i64>,
    pub total_price: Money,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptOrderRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishOrderRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrabRequest {
    pub order_id: OrderId,
    pub rider_id: RiderId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RiderCompleteRequest {
    pub order_id: OrderId,
    pub rider_id: RiderId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub rider_id: Option<RiderId>,
    pub product_id: ProductId,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub status: OrderStatus,
    pub total_price: Money,
    pub delivery_fee: Money,
    pub group_id: Option<i64>,
}

impl From<crate::order::Order> for OrderView {
    fn from(o: crate::order::Order) -> Self {
        Self {
            order_id: o.id,
            user_id: o.user_id,
            shop_id: o.shop_id,
            rider_id: o.rider_id,
            product_id: o.product_id,
            quantity: o.quantity,
            status: o.status,
            total_price: o.total_price,
            delivery_fee: o.delivery_fee,
            group_id: o.group_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendMessageRequest {
    pub group_id: GroupId,
    pub sender_id: i64,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MessagesQuery {
    pub group_id: GroupId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageView {
    pub id: MessageId,
    pub group_id: GroupId,
    pub sender_id: i64,
    pub sender_role: SenderRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<crate::message::Message> for MessageView {
    fn from(m: crate::message::Message) -> Self {
        Self {
            id: m.id,
            group_id: m.group_id,
            sender_id: m.sender_id,
            sender_role: m.sender_role,
            content: m.content,
            timestamp: m.timestamp,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterBody {
    pub role: Role,
    pub actor_id: i64,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub account_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// The chat surface reuses the auth role set under a different name
/// (`message::SenderRole`) since a message's author role outlives any
/// single token and is persisted, not just claimed.
pub fn sender_role_of(role: Role) -> SenderRole {
    match role {
        Role::User => SenderRole::User,
        Role::Shop => SenderRole::Shop,
        Role::Rider => SenderRole::Rider,
    }
}
