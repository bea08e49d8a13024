//! `/api/user/im/*` (spec.md §6): in-order chat within a delivery's group.
//! Role band: any authenticated actor (`user`/`shop`/`rider`), restricted
//! to the group's three members.

use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use validator::Validate;

use crate::auth::AuthenticatedActor;
use crate::error::{ApiError, ApiErrorCode};
use crate::gateway::state::AppState;
use crate::gateway::types::{MessageView, MessagesQuery, SendMessageRequest, sender_role_of};

async fn check_membership(state: &AppState, actor: &AuthenticatedActor, group_id: i64) -> Result<(), ApiError> {
    let group = state.groups.get_by_id(group_id).await?;
    let is_member = group.user_id == actor.id || group.shop_id == actor.id || group.rider_id == Some(actor.id);
    if !is_member {
        return Err(ApiError::new(ApiErrorCode::Forbidden, "caller is not a member of this group"));
    }
    Ok(())
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.sender_id != actor.id {
        return Err(ApiError::new(
            ApiErrorCode::Forbidden,
            "sender_id does not match the authenticated caller",
        ));
    }
    body.validate()
        .map_err(|e| ApiError::new(ApiErrorCode::InvalidParameter, e.to_string()))?;
    check_membership(&state, &actor, body.group_id).await?;

    let message = state
        .chat
        .send(body.group_id, actor.id, sender_role_of(actor.role), body.content)
        .await?;

    Ok(Json(MessageView::from(message)))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    check_membership(&state, &actor, query.group_id).await?;

    let messages = state.chat.list(query.group_id).await?;
    Ok(Json(messages.into_iter().map(MessageView::from).collect()))
}
