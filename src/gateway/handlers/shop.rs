//! `/api/shop/*` (spec.md §6): merchant-side transitions. Role band: `shop`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Extension;

use crate::auth::{AuthenticatedActor, Role, require_role};
use crate::error::ApiError;
use crate::gateway::state::AppState;
use crate::gateway::types::{AcceptOrderRequest, OrderView, PublishOrderRequest};

pub async fn accept_order(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(body): Json<AcceptOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&actor, Role::Shop)?;
    let order = state.orders.merchant_confirm(actor.id, body.order_id).await?;
    Ok(Json(OrderView::from(order)))
}

pub async fn publish_order(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(body): Json<PublishOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&actor, Role::Shop)?;
    let order = state.orders.publish_delivery(actor.id, body.order_id).await?;
    Ok(Json(OrderView::from(order)))
}
