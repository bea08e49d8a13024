//! HTTP gateway (spec.md §6): the one API surface this core exposes,
//! grounded on the teacher's `gateway` module — one `Router` built from a
//! shared `AppState`, public routes split from bearer-token-protected ones
//! via a `from_fn_with_state` auth layer, with Swagger UI mounted for the
//! same discoverability spec.md's endpoint table documents by hand.

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthService, auth_middleware};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(),
    components(schemas(
        types::PlaceOrderRequest,
        types::PlaceOrderResponse,
        types::OrderStatusResponse,
        types::AcceptOrderRequest,
        types::PublishOrderRequest,
        types::GrabRequest,
        types::RiderCompleteRequest,
        types::OrderView,
        types::SendMessageRequest,
        types::MessageView,
        types::RegisterBody,
        types::RegisterResponse,
        types::LoginBody,
        types::TokenResponse,
    )),
    tags((name = "takeout-core", description = "Order orchestration core"))
)]
pub struct ApiDoc;

pub fn router(state: Arc<AppState>, auth: Arc<AuthService>) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    let protected = Router::new()
        .route("/api/user/order", post(handlers::order::place_order))
        .route("/api/user/order/status", get(handlers::order::order_status))
        .route("/api/shop/accept_order", post(handlers::shop::accept_order))
        .route("/api/shop/publish_order", post(handlers::shop::publish_order))
        .route("/api/rider/grab", post(handlers::rider::grab))
        .route("/api/rider/complete", post(handlers::rider::complete))
        .route("/api/user/im/send", post(handlers::chat::send_message))
        .route("/api/user/im/messages", get(handlers::chat::list_messages))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .layer(axum_middleware::from_fn_with_state(auth, auth_middleware));

    public
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
