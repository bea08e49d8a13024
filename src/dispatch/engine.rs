//! Dispatch Engine (C4): push-then-pull courier assignment.
//!
//! Grounded on `transfer::channel`'s oneshot-over-mpsc request/response shape
//! (generalized into a per-rider offer registry) and `transfer::worker`'s
//! periodic-loop shape for the overall run-to-completion deadline; the
//! push/pull split itself is grounded on `handlers/order.go`'s
//! `handNotifyNearbyRider`/`GetOrderListFromMQ`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot};

use crate::cache::Cache;
use crate::cache::keys::{PUBLIC_HALL, rider_channel};
use crate::config::DispatchConfig;
use crate::core_types::{OrderId, RiderId};
use crate::dispatch::error::DispatchError;
use crate::dispatch::geo::nearest_within;
use crate::order::coordinator::OrderCoordinator;
use crate::order::error::OrderError;
use crate::order::status::OrderStatus;
use crate::order::store::OrderStore;
use crate::rider::store::RiderStore;
use crate::shop::store::ShopStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderResponse {
    Accept,
    Reject,
}

/// Per-process dispatch coordinator. One instance is shared by the HTTP
/// layer (to register offer responses) and the background loop (to run
/// dispatch attempts).
pub struct DispatchEngine {
    coordinator: Arc<OrderCoordinator>,
    order_store: Arc<dyn OrderStore>,
    riders: Arc<dyn RiderStore>,
    shops: Arc<dyn ShopStore>,
    cache: Arc<Cache>,
    config: DispatchConfig,
    in_flight: DashMap<OrderId, ()>,
    offers: DashMap<RiderId, oneshot::Sender<RiderResponse>>,
}

impl DispatchEngine {
    pub fn new(
        coordinator: Arc<OrderCoordinator>,
        order_store: Arc<dyn OrderStore>,
        riders: Arc<dyn RiderStore>,
        shops: Arc<dyn ShopStore>,
        cache: Arc<Cache>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            coordinator,
            order_store,
            riders,
            shops,
            cache,
            config,
            in_flight: DashMap::new(),
            offers: DashMap::new(),
        }
    }

    /// Consumes the channel populated by `OrderCoordinator::publish_delivery`,
    /// spawning one dispatch task per order. Runs forever; intended to be
    /// `tokio::spawn`ed once at startup.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<OrderId>) {
        while let Some(order_id) = rx.recv().await {
            let engine = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(err) = engine.dispatch(order_id).await {
                    tracing::warn!(order_id, error = %err, "dispatch run ended without assignment");
                }
            });
        }
    }

    /// A rider client resolves a pending offer. Returns `true` if an offer
    /// was actually pending (a stale response after timeout is a no-op).
    pub fn respond_to_offer(&self, rider_id: RiderId, response: RiderResponse) -> bool {
        if let Some((_, tx)) = self.offers.remove(&rider_id) {
            tx.send(response).is_ok()
        } else {
            false
        }
    }

    /// Runs one dispatch attempt for `order_id`: push phase over nearby
    /// online couriers, then a public-hall fallback, honoring the overall
    /// `T_dispatch` deadline (spec.md §4.2 step 6). A duplicate call for an
    /// order already in flight is a documented no-op.
    pub async fn dispatch(&self, order_id: OrderId) -> Result<(), DispatchError> {
        if self.in_flight.insert(order_id, ()).is_some() {
            return Err(DispatchError::AlreadyInFlight);
        }
        let result = self.dispatch_inner(order_id).await;
        self.in_flight.remove(&order_id);
        result
    }

    async fn dispatch_inner(&self, order_id: OrderId) -> Result<(), DispatchError> {
        let deadline = Instant::now() + self.config.dispatch_timeout;

        let order = self.order_store.get(order_id).await?;
        if order.status != OrderStatus::DeliveryPublished {
            // Already moved on (assigned/canceled) by a concurrent path.
            return Ok(());
        }
        let shop = self.shops.get(order.shop_id).await?;

        let online = self.riders.list_online().await?;
        let mut candidates = nearest_within(
            (shop.lat, shop.lng),
            online,
            |r| (r.lat, r.lng),
            self.config.radius_km,
            self.config.max_candidates,
        );
        candidates.shuffle(&mut rand::thread_rng());

        for rider in candidates {
            if Instant::now() >= deadline {
                break;
            }
            match self.offer(order_id, rider.id, deadline).await {
                Ok(RiderResponse::Accept) => match self.coordinator.rider_accept(rider.id, order_id).await {
                    Ok(_) => return Ok(()),
                    Err(OrderError::Conflict(_)) => continue,
                    Err(err) => return Err(DispatchError::from(err)),
                },
                Ok(RiderResponse::Reject) | Err(_) => continue,
            }
        }

        // Pull phase: broadcast on the public-hall queue for any eligible
        // courier to claim out-of-band via `rider_accept`.
        self.cache.lpush(PUBLIC_HALL, &order_id.to_string()).await?;

        self.await_assignment(order_id, deadline).await
    }

    /// Publishes one offer and races the rider's response against
    /// `T_offer`. A timeout is treated identically to an explicit reject.
    async fn offer(
        &self,
        order_id: OrderId,
        rider_id: RiderId,
        overall_deadline: Instant,
    ) -> Result<RiderResponse, DispatchError> {
        let (tx, rx) = oneshot::channel();
        self.offers.insert(rider_id, tx);

        let channel = rider_channel(rider_id);
        if let Err(err) = self.cache.publish(&channel, &order_id.to_string()).await {
            self.offers.remove(&rider_id);
            return Err(DispatchError::from(err));
        }

        let remaining = overall_deadline.saturating_duration_since(Instant::now());
        let timeout = self.config.offer_timeout.min(remaining.max(Duration::from_millis(1)));

        let result = tokio::time::timeout(timeout, rx).await;
        self.offers.remove(&rider_id);

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) | Err(_) => Ok(RiderResponse::Reject),
        }
    }

    /// Polls store state until the order is assigned or the deadline
    /// passes, for the pull-phase fallback (spec.md §4.2 step 6).
    async fn await_assignment(&self, order_id: OrderId, deadline: Instant) -> Result<(), DispatchError> {
        let poll_interval = Duration::from_millis(200);
        loop {
            let order = self.order_store.get(order_id).await?;
            if order.status != OrderStatus::DeliveryPublished {
                return Ok(());
            }
            if Instant::now() >= deadline {
                tracing::warn!(order_id, "dispatch deadline exceeded, emitting DispatchFailed");
                return Err(DispatchError::Timeout);
            }
            tokio::time::sleep(poll_interval.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }
}

/// Guards concurrent construction of the dispatch channel pair so callers
/// share one engine instance without racing on setup.
pub fn dispatch_channel(buffer: usize) -> (mpsc::Sender<OrderId>, mpsc::Receiver<OrderId>) {
    mpsc::channel(buffer)
}
