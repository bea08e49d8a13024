//! `/api/auth/*`: credential issuance (SPEC_FULL.md §4.7). Unauthenticated
//! except `logout`, which needs a live token to know which `jti` to revoke.

use std::sync::Arc;

use axum::Extension;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use validator::Validate;

use crate::auth::Claims;
use crate::error::{ApiError, ApiErrorCode};
use crate::gateway::state::AppState;
use crate::gateway::types::{LoginBody, RegisterBody, RegisterResponse, TokenResponse};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::new(ApiErrorCode::InvalidParameter, e.to_string()))?;

    let account_id = state
        .auth
        .register(crate::auth::service::RegisterRequest {
            role: body.role,
            actor_id: body.actor_id,
            username: body.username,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { account_id })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .auth
        .login(crate::auth::service::LoginRequest {
            username: body.username,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TokenResponse { token }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    state.auth.revoke(&claims).await.map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
