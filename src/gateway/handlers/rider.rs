//! `/api/rider/*` (spec.md §6): courier-side transitions. Role band:
//! `rider`.

use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::auth::{AuthenticatedActor, Role, require_role};
use crate::dispatch::RiderResponse;
use crate::error::{ApiError, ApiErrorCode};
use crate::gateway::state::AppState;
use crate::gateway::types::{GrabRequest, OrderView, RiderCompleteRequest};

fn check_rider_identity(actor: &AuthenticatedActor, rider_id: i64) -> Result<(), ApiError> {
    if actor.id != rider_id {
        return Err(ApiError::new(
            ApiErrorCode::Forbidden,
            "rider_id does not match the authenticated caller",
        ));
    }
    Ok(())
}

/// A courier claims an order, either by answering a live push offer or by
/// pulling it directly off the public-hall queue (spec.md §4.2 step 6).
pub async fn grab(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(body): Json<GrabRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&actor, Role::Rider)?;
    check_rider_identity(&actor, body.rider_id)?;

    // If an offer is currently outstanding for this rider, resolve it
    // in-process; the dispatch task picks up the acceptance on its own.
    // Either way `rider_accept` is the authoritative CAS, so calling it
    // unconditionally here is safe even when there was no live offer.
    state.dispatch.respond_to_offer(body.rider_id, RiderResponse::Accept);

    let order = state.orders.rider_accept(body.rider_id, body.order_id).await?;
    Ok(Json(OrderView::from(order)))
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(body): Json<RiderCompleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&actor, Role::Rider)?;
    check_rider_identity(&actor, body.rider_id)?;

    let order = state.orders.rider_complete(body.rider_id, body.order_id).await?;
    Ok(Json(OrderView::from(order)))
}
