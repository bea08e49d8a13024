//! `/api/user/order*` (spec.md §6): place and inspect orders. Role band:
//! `user`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Extension, http::StatusCode};

use validator::Validate;

use crate::auth::{AuthenticatedActor, Role, require_role};
use crate::error::{ApiError, ApiErrorCode};
use crate::gateway::state::AppState;
use crate::gateway::types::{OrderIdQuery, OrderStatusResponse, PlaceOrderRequest, PlaceOrderResponse};

pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&actor, Role::User)?;
    body.validate()
        .map_err(|e| ApiError::new(ApiErrorCode::InvalidParameter, e.to_string()))?;

    let order = state.orders.place(actor.id, body.product_id, body.quantity).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            order_id: order.id,
            total_price: order.total_price,
            status: order.status,
        }),
    ))
}

pub async fn order_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Query(query): Query<OrderIdQuery>,
) -> Result<Json<OrderStatusResponse>, ApiError> {
    require_role(&actor, Role::User)?;

    let order = state.orders.get_for_user(actor.id, query.order_id).await?;

    Ok(Json(OrderStatusResponse {
        order_id: order.id,
        status: order.status,
        rider_id: order.rider_id,
        group_id: order.group_id,
        total_price: order.total_price,
    }))
}
