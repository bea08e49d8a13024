//! Crate-wide API error type.
//!
//! Every domain error (`OrderError`, `DispatchError`, `StockError`, ...)
//! converts into `ApiError` via `From`, which is the only error type the
//! HTTP layer speaks. Shape follows `api_auth::error::AuthError`: a stable
//! numeric code, a name, an HTTP status, and a JSON body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::dispatch::DispatchError;
use crate::order::OrderError;
use crate::product::StockError;

/// Numeric error codes returned to clients, grouped by component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ApiErrorCode {
    /// 1001: request body failed validation
    InvalidParameter = 1001,
    /// 2001: Authorization header missing
    MissingAuth = 2001,
    /// 2002: token invalid, expired, or revoked
    AuthFailed = 2002,
    /// 2003: caller's role/ownership does not permit this operation
    Forbidden = 2003,
    /// 4001: order not found
    OrderNotFound = 4001,
    /// 4002: transition not legal from the order's current status
    IllegalTransition = 4002,
    /// 4003: order already owned by another rider/shop
    Conflict = 4003,
    /// 4101: dispatch could not find or confirm a courier in time
    DispatchFailed = 4101,
    /// 4201: insufficient stock to reserve
    OutOfStock = 4201,
    /// 5001: durable store or cache unavailable
    ServiceUnavailable = 5001,
    /// 5002: unexpected internal error
    InternalError = 5002,
}

impl ApiErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::MissingAuth => "MISSING_AUTH",
            Self::AuthFailed => "AUTH_FAILED",
            Self::Forbidden => "FORBIDDEN",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::IllegalTransition => "ILLEGAL_TRANSITION",
            Self::Conflict => "CONFLICT",
            Self::DispatchFailed => "DISPATCH_FAILED",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidParameter => StatusCode::BAD_REQUEST,
            Self::MissingAuth | Self::AuthFailed => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::IllegalTransition | Self::Conflict | Self::OutOfStock => StatusCode::CONFLICT,
            Self::DispatchFailed => StatusCode::GATEWAY_TIMEOUT,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The error type returned by every handler in the gateway.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code.code(),
            error: self.code.name(),
            message: self.message,
        };
        (self.code.http_status(), Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let code = match err {
            OrderError::NotFound(_) => ApiErrorCode::OrderNotFound,
            OrderError::IllegalTransition { .. } => ApiErrorCode::IllegalTransition,
            OrderError::OwnershipViolation { .. } => ApiErrorCode::Forbidden,
            OrderError::Conflict(_) => ApiErrorCode::Conflict,
            OrderError::OutOfStock(_) => ApiErrorCode::OutOfStock,
            OrderError::TransientStorage(_) => ApiErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let code = match err {
            DispatchError::NoCandidates | DispatchError::Timeout => ApiErrorCode::DispatchFailed,
            DispatchError::AlreadyInFlight => ApiErrorCode::Conflict,
            DispatchError::Storage(_) => ApiErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        let code = match err {
            StockError::Insufficient { .. } => ApiErrorCode::OutOfStock,
            StockError::NotFound(_) => ApiErrorCode::OrderNotFound,
            StockError::Storage(_) => ApiErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::new(ApiErrorCode::InternalError, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_documented_values() {
        assert_eq!(ApiErrorCode::InvalidParameter.code(), 1001);
        assert_eq!(ApiErrorCode::MissingAuth.code(), 2001);
        assert_eq!(ApiErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ApiErrorCode::DispatchFailed.code(), 4101);
        assert_eq!(ApiErrorCode::OutOfStock.code(), 4201);
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(
            ApiErrorCode::OrderNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiErrorCode::Conflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiErrorCode::Forbidden.http_status(),
            StatusCode::FORBIDDEN
        );
    }
}
