//! End-to-end lifecycle scenarios (spec.md §8). These exercise the real
//! `OrderCoordinator`/`DispatchEngine` against live Postgres and Redis —
//! unlike the unit suites next to each module (which use the `Fake*`
//! stores), the write-through cache here is the real client, so these
//! need actual infrastructure and are `#[ignore]`d by default, mirroring
//! `db::tests::connect_and_health_check`.
//!
//! Run with: `DB_NAME=takeout_test REDIS_ADDR=localhost:6379 JWT_SECRET_KEY=test cargo test --test order_lifecycle -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use takeout_core::cache::Cache;
use takeout_core::config::{DbConfig, RedisConfig};
use takeout_core::db::Database;
use takeout_core::dispatch::{DispatchEngine, RiderResponse, dispatch_channel};
use takeout_core::group::ChatGroupProvisioner;
use takeout_core::group::store::PgGroupStore;
use takeout_core::order::OrderCoordinator;
use takeout_core::order::store::PgOrderStore;
use takeout_core::order::transactions::PgOrderTransactions;
use takeout_core::product::StockReservation;
use takeout_core::product::store::PgProductStore;
use takeout_core::rider::store::PgRiderStore;
use takeout_core::shop::store::PgShopStore;

fn test_db_config() -> DbConfig {
    DbConfig {
        host: "localhost".into(),
        port: 5432,
        user: "takeout".into(),
        password: "takeout".into(),
        name: "takeout_test".into(),
        sslmode: "disable".into(),
        pool_size: 5,
    }
}

fn test_redis_config() -> RedisConfig {
    RedisConfig {
        addr: "localhost:6379".into(),
        password: None,
        db: 1,
    }
}

struct Harness {
    coordinator: Arc<OrderCoordinator>,
    dispatch: Arc<DispatchEngine>,
}

async fn build_harness() -> Harness {
    let db = Database::connect(&test_db_config()).await.expect("connect db");
    let cache = Arc::new(Cache::connect(&test_redis_config()).await.expect("connect redis"));

    let orders = Arc::new(PgOrderStore::new(db.pool().clone()));
    let products = Arc::new(PgProductStore::new(db.pool().clone()));
    let shops = Arc::new(PgShopStore::new(db.pool().clone()));
    let riders = Arc::new(PgRiderStore::new(db.pool().clone()));
    let groups_store = Arc::new(PgGroupStore::new(db.pool().clone()));

    let reservation = Arc::new(StockReservation::new(products.clone(), cache.clone()));
    let groups = Arc::new(ChatGroupProvisioner::new(groups_store, cache.clone()));
    let transactions = Arc::new(PgOrderTransactions::new(db.pool().clone()));

    let (tx, rx) = dispatch_channel(16);
    let coordinator = Arc::new(
        OrderCoordinator::new(
            orders.clone(),
            products,
            shops.clone(),
            reservation,
            groups,
            transactions,
            riders.clone(),
            cache.clone(),
            Duration::from_secs(3600),
        )
        .with_dispatch_channel(tx),
    );

    let dispatch = Arc::new(DispatchEngine::new(
        coordinator.clone(),
        orders,
        riders,
        shops,
        cache,
        Default::default(),
    ));
    tokio::spawn(Arc::clone(&dispatch).run(rx));

    Harness { coordinator, dispatch }
}

/// S1: happy path — place, confirm, publish, a rider grabs it, rider
/// completes it. Fixture data (shop 1, product 1 with stock, rider 1
/// online near the shop) is assumed pre-seeded by the test database.
#[tokio::test]
#[ignore]
async fn happy_path_reaches_completed() {
    let h = build_harness().await;

    let order = h.coordinator.place(1, 1, 1).await.expect("place");
    let order = h.coordinator.merchant_confirm(1, order.id).await.expect("confirm");
    assert!(order.group_id.is_some());

    let order = h.coordinator.publish_delivery(1, order.id).await.expect("publish");
    let order_id = order.id;

    // Give the dispatch task a moment to push-offer rider 1, then resolve
    // the offer as a client grab would.
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.dispatch.respond_to_offer(1, RiderResponse::Accept);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let order = h.coordinator.get_for_user(1, order_id).await.expect("assigned");
    assert_eq!(order.rider_id, Some(1));

    let order = h.coordinator.rider_complete(1, order_id).await.expect("complete");
    assert!(order.status.is_terminal());
}

/// S2: two riders race `rider_accept` on the same order — exactly one
/// wins, the other observes `Conflict`.
#[tokio::test]
#[ignore]
async fn concurrent_accept_is_first_writer_wins() {
    let h = build_harness().await;
    let order = h.coordinator.place(1, 1, 1).await.expect("place");
    let order = h.coordinator.merchant_confirm(1, order.id).await.expect("confirm");
    let order = h.coordinator.publish_delivery(1, order.id).await.expect("publish");

    let a = h.coordinator.rider_accept(1, order.id);
    let b = h.coordinator.rider_accept(2, order.id);
    let (a, b) = tokio::join!(a, b);

    assert!(a.is_ok() ^ b.is_ok(), "exactly one acceptance should win");
}

/// S5: stock exhaustion — placing past available stock returns
/// `OutOfStock` and leaves the counter untouched.
#[tokio::test]
#[ignore]
async fn out_of_stock_product_is_refused() {
    let h = build_harness().await;
    // Fixture product 2 is seeded with stock = 0.
    let result = h.coordinator.place(1, 2, 1).await;
    assert!(result.is_err());
}
