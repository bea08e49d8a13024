use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error::{ApiError, ApiErrorCode};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("malformed Authorization header")]
    InvalidFormat,
    #[error("token invalid, expired, or revoked")]
    InvalidToken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("an account with this username already exists")]
    DuplicateAccount,
    #[error("caller's role does not permit this operation")]
    RoleMismatch,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = match err {
            AuthError::MissingHeader => ApiErrorCode::MissingAuth,
            AuthError::InvalidFormat
            | AuthError::InvalidToken
            | AuthError::InvalidCredentials => ApiErrorCode::AuthFailed,
            AuthError::DuplicateAccount => ApiErrorCode::InvalidParameter,
            AuthError::RoleMismatch => ApiErrorCode::AuthFailed,
            AuthError::Storage(_) => ApiErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
