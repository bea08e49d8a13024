//! takeout-core — boots the order orchestration core: connects to
//! Postgres and Redis, wires every store/service, spawns the Dispatch
//! Engine and Cleanup Scheduler background loops, and serves the HTTP
//! gateway.

use std::sync::Arc;

use takeout_core::auth::AuthService;
use takeout_core::auth::blacklist::PgTokenBlacklist;
use takeout_core::cache::Cache;
use takeout_core::cleanup::CleanupScheduler;
use takeout_core::config::AppConfig;
use takeout_core::db::Database;
use takeout_core::dispatch::{DispatchEngine, dispatch_channel};
use takeout_core::gateway::{self, state::AppState};
use takeout_core::group::ChatGroupProvisioner;
use takeout_core::group::store::PgGroupStore;
use takeout_core::message::ChatService;
use takeout_core::message::store::PgMessageStore;
use takeout_core::order::OrderCoordinator;
use takeout_core::order::store::PgOrderStore;
use takeout_core::order::transactions::PgOrderTransactions;
use takeout_core::product::StockReservation;
use takeout_core::product::store::PgProductStore;
use takeout_core::rider::store::PgRiderStore;
use takeout_core::shop::store::PgShopStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = takeout_core::logging::init_logging(&config);

    tracing::info!(git_hash = env!("GIT_HASH"), "starting takeout-core");

    let db = Database::connect(&config.db).await?;
    let cache = Arc::new(Cache::connect(&config.redis).await?);

    let order_store = Arc::new(PgOrderStore::new(db.pool().clone()));
    let product_store = Arc::new(PgProductStore::new(db.pool().clone()));
    let shop_store = Arc::new(PgShopStore::new(db.pool().clone()));
    let rider_store = Arc::new(PgRiderStore::new(db.pool().clone()));
    let group_store = Arc::new(PgGroupStore::new(db.pool().clone()));
    let message_store = Arc::new(PgMessageStore::new(db.pool().clone()));
    let blacklist = Arc::new(PgTokenBlacklist::new(db.pool().clone()));

    let reservation = Arc::new(StockReservation::new(product_store.clone(), cache.clone()));
    let groups = Arc::new(ChatGroupProvisioner::new(group_store.clone(), cache.clone()));
    let transactions = Arc::new(PgOrderTransactions::new(db.pool().clone()));
    let chat = Arc::new(ChatService::new(message_store.clone(), cache.clone()));
    let auth = Arc::new(AuthService::new(db.pool().clone(), blacklist, config.jwt_secret.clone()));

    let (dispatch_tx, dispatch_rx) = dispatch_channel(1024);

    let coordinator = Arc::new(
        OrderCoordinator::new(
            order_store.clone(),
            product_store.clone(),
            shop_store.clone(),
            reservation,
            groups.clone(),
            transactions,
            rider_store.clone(),
            cache.clone(),
            config.cache_ttl,
        )
        .with_dispatch_channel(dispatch_tx),
    );

    let dispatch_engine = Arc::new(DispatchEngine::new(
        coordinator.clone(),
        order_store.clone(),
        rider_store.clone(),
        shop_store.clone(),
        cache.clone(),
        config.dispatch,
    ));
    tokio::spawn(Arc::clone(&dispatch_engine).run(dispatch_rx));

    let cleanup = Arc::new(CleanupScheduler::new(order_store, message_store, config.cleanup));
    tokio::spawn(cleanup.run());

    let state = Arc::new(AppState {
        orders: coordinator,
        dispatch: dispatch_engine,
        chat,
        groups,
        auth: auth.clone(),
        products: product_store,
        shops: shop_store,
        riders: rider_store,
    });

    let app = gateway::router(state, auth);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!(port = config.http_port, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
