//! Order State Machine (C3): validates and applies transitions, owning
//! write-through to the store and cache. Grounded on
//! `transfer::coordinator::TransferCoordinator` — load, match on current
//! status, issue a compare-and-swap update — generalized from a single
//! generic `step()` loop into one explicit method per spec.md §4.1 event,
//! since each event here maps to exactly one HTTP endpoint rather than a
//! retryable multi-hop saga.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::cache::Cache;
use crate::cache::keys::{ORDER_CHANNEL, order_status_key};
use crate::core_types::{OrderId, ProductId, RiderId, ShopId, UserId};
use crate::group::provisioner::ChatGroupProvisioner;
use crate::order::error::OrderError;
use crate::order::model::Order;
use crate::order::status::OrderStatus;
use crate::order::transactions::OrderTransactions;
use crate::product::reservation::StockReservation;
use crate::product::store::ProductStore;
use crate::rider::model::RiderStatus;
use crate::rider::store::RiderStore;
use crate::shop::store::ShopStore;

use super::store::OrderStore;

pub struct OrderCoordinator {
    store: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    shops: Arc<dyn ShopStore>,
    reservation: Arc<StockReservation>,
    groups: Arc<ChatGroupProvisioner>,
    /// Owns the cross-table atomicity that a single `OrderStore`/`GroupStore`
    /// call can't provide on its own: order-create-with-stock-deduction,
    /// confirm-with-group-create, accept-with-group-attach.
    transactions: Arc<dyn OrderTransactions>,
    riders: Arc<dyn RiderStore>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
    /// Notifies the Dispatch Engine that an order is ready for push/pull
    /// dispatch. `None` in tests that exercise the state machine in
    /// isolation.
    dispatch_tx: Option<mpsc::Sender<OrderId>>,
}

impl OrderCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        shops: Arc<dyn ShopStore>,
        reservation: Arc<StockReservation>,
        groups: Arc<ChatGroupProvisioner>,
        transactions: Arc<dyn OrderTransactions>,
        riders: Arc<dyn RiderStore>,
        cache: Arc<Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            products,
            shops,
            reservation,
            groups,
            transactions,
            riders,
            cache,
            cache_ttl,
            dispatch_tx: None,
        }
    }

    pub fn with_dispatch_channel(mut self, tx: mpsc::Sender<OrderId>) -> Self {
        self.dispatch_tx = Some(tx);
        self
    }

    /// `place(user, shop, product, qty)` → awaiting_merchant.
    /// `shop_id` is derived from the product's own row — the HTTP body
    /// (spec.md §6) carries only `{product_id, quantity}`; a product binds
    /// to exactly one shop.
    pub async fn place(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Order, OrderError> {
        let product = self
            .products
            .get(product_id)
            .await
            .map_err(|e| OrderError::TransientStorage(e.to_string()))?;
        let shop_id = product.shop_id;
        let shop = self.shops.get(shop_id).await?;
        let delivery_fee = shop.delivery_fee;

        let order = if product.is_flash_sale {
            self.reservation
                .reserve(&product, quantity)
                .await
                .map_err(|e| OrderError::TransientStorage(e.to_string()))?;

            match self
                .store
                .create(user_id, shop_id, product_id, quantity, product.price, delivery_fee)
                .await
            {
                Ok(order) => order,
                Err(err) => {
                    // Compensating release: the order row never landed, so the
                    // reservation must be undone (spec.md invariant 4).
                    if let Err(release_err) = self.reservation.release(&product, quantity).await {
                        tracing::error!(error = %release_err, "failed to release stock after failed order create");
                    }
                    return Err(err);
                }
            }
        } else {
            // Regular products: stock deduction and order insert commit or
            // fail together (spec.md §4.4 / invariant 4).
            self.transactions
                .place_regular(user_id, shop_id, product_id, quantity, product.price, delivery_fee)
                .await?
        };

        self.write_through_status(&order).await;
        if let Err(err) = self.cache.publish(ORDER_CHANNEL, &order.id.to_string()).await {
            tracing::warn!(order_id = order.id, error = %err, "failed to publish order_channel event");
        }

        Ok(order)
    }

    /// `merchant_confirm(shop)` → merchant_confirmed; creates the Group in
    /// the same transaction (spec.md §4.3 / invariant 3).
    pub async fn merchant_confirm(&self, shop_id: ShopId, order_id: OrderId) -> Result<Order, OrderError> {
        let (order, group) = self.transactions.confirm_with_group(order_id, shop_id).await?;
        self.groups.populate_cache(&group).await;
        self.write_through_status(&order).await;
        Ok(order)
    }

    /// `publish_delivery(shop)` → delivery_published; kicks C4.
    pub async fn publish_delivery(&self, shop_id: ShopId, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;
        self.check_shop_ownership(&order, shop_id)?;

        let updated = self
            .store
            .update_status_if(order_id, OrderStatus::MerchantConfirmed, OrderStatus::DeliveryPublished)
            .await?;

        self.write_through_status(&updated).await;

        if let Some(tx) = &self.dispatch_tx {
            if tx.send(order_id).await.is_err() {
                tracing::warn!(order_id, "dispatch engine channel closed");
            }
        }

        Ok(updated)
    }

    /// `rider_accept(rider)` → assigned; first-writer-wins. The Group's
    /// `rider_id` attach commits in the same transaction as the CAS, so a
    /// chat membership check never sees an assigned order with a
    /// rider-less group (spec.md §4.3).
    pub async fn rider_accept(&self, rider_id: RiderId, order_id: OrderId) -> Result<Order, OrderError> {
        let (updated, group) = self.transactions.accept_with_group(order_id, rider_id).await?;
        self.groups.populate_cache(&group).await;

        if let Err(err) = self.riders.set_status(rider_id, RiderStatus::Busy).await {
            tracing::warn!(order_id, rider_id, error = %err, "failed to mark rider busy");
        }

        self.write_through_status(&updated).await;
        Ok(updated)
    }

    /// `rider_complete(rider)` → completed, from either `assigned` or the
    /// optional `delivering` sub-state.
    pub async fn rider_complete(&self, rider_id: RiderId, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;
        if order.rider_id != Some(rider_id) {
            return Err(OrderError::OwnershipViolation {
                order_id,
                actor_id: rider_id,
            });
        }

        let from = order.status;
        if from != OrderStatus::Assigned && from != OrderStatus::Delivering {
            return Err(OrderError::IllegalTransition {
                order_id,
                from: from.as_str(),
            });
        }

        let updated = self
            .store
            .update_status_if(order_id, from, OrderStatus::Completed)
            .await?;

        if let Err(err) = self.riders.set_status(rider_id, RiderStatus::Online).await {
            tracing::warn!(order_id, rider_id, error = %err, "failed to release rider");
        }

        self.write_through_status(&updated).await;
        Ok(updated)
    }

    /// `cancel` — legal from any pre-`delivery_published`-exit state;
    /// compensating stock return.
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let order = self.store.get(order_id).await?;
        let from = order.status;
        if !from.can_transition_to(OrderStatus::Canceled) {
            return Err(OrderError::IllegalTransition {
                order_id,
                from: from.as_str(),
            });
        }

        let updated = self.store.update_status_if(order_id, from, OrderStatus::Canceled).await?;

        if let Ok(product) = self.products.get(order.product_id).await {
            if let Err(err) = self.reservation.release(&product, order.quantity).await {
                tracing::error!(order_id, error = %err, "failed to return stock on cancel");
            }
        }

        self.write_through_status(&updated).await;
        Ok(updated)
    }

    /// Fetches an order for its owning user, enforcing ownership before
    /// returning the row (spec.md §6's `GET .../order/status`). C7
    /// read-through: a cache hit on `order_status_{id}` skips Postgres
    /// entirely; a miss falls back to the store and repopulates the cache.
    pub async fn get_for_user(&self, user_id: UserId, order_id: OrderId) -> Result<Order, OrderError> {
        let order = match self.read_through_status(order_id).await {
            Some(order) => order,
            None => {
                let order = self.store.get(order_id).await?;
                self.cache_status(&order).await;
                order
            }
        };

        if order.user_id != user_id {
            return Err(OrderError::OwnershipViolation {
                order_id,
                actor_id: user_id,
            });
        }
        Ok(order)
    }

    /// Looks up the cached projection for an order, if present and
    /// deserializable. `None` means the caller must fall back to the store.
    async fn read_through_status(&self, order_id: OrderId) -> Option<Order> {
        let key = order_status_key(order_id);
        let payload = match self.cache.get(&key).await {
            Ok(payload) => payload?,
            Err(err) => {
                tracing::warn!(order_id, error = %err, "cache read-through failed");
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(order) => Some(order),
            Err(err) => {
                tracing::warn!(order_id, error = %err, "cached order payload unreadable");
                None
            }
        }
    }

    fn check_shop_ownership(&self, order: &Order, shop_id: ShopId) -> Result<(), OrderError> {
        check_shop_ownership(order, shop_id)
    }

    /// C7 write-through: serialize and cache the new projection, publish
    /// the status change. Best-effort; failures are logged, not fatal.
    async fn write_through_status(&self, order: &Order) {
        let Some(payload) = self.cache_status(order).await else {
            return;
        };
        let channel = format!("order_status:{}", order.id);
        if let Err(err) = self.cache.publish(&channel, &payload).await {
            tracing::warn!(order_id = order.id, error = %err, "status publish failed");
        }
    }

    /// Serializes and caches an order's projection under `order_status_{id}`,
    /// returning the payload written on success. Shared by write-through
    /// (after a transition) and read-repair (after a cache-miss fetch).
    async fn cache_status(&self, order: &Order) -> Option<String> {
        let key = order_status_key(order.id);
        match serde_json::to_string(order) {
            Ok(payload) => {
                if let Err(err) = self.cache.set_ex(&key, &payload, self.cache_ttl).await {
                    tracing::warn!(order_id = order.id, error = %err, "cache write-through failed");
                }
                Some(payload)
            }
            Err(err) => {
                tracing::error!(order_id = order.id, error = %err, "failed to serialize order");
                None
            }
        }
    }
}

/// Free function so it's testable without constructing an `OrderCoordinator`
/// (which needs a live `Cache` connection); `check_shop_ownership` is a
/// thin `&self` wrapper kept for call-site readability.
fn check_shop_ownership(order: &Order, shop_id: ShopId) -> Result<(), OrderError> {
    if order.shop_id != shop_id {
        return Err(OrderError::OwnershipViolation {
            order_id: order.id,
            actor_id: shop_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::status::OrderStatus;

    fn sample_order(shop_id: ShopId) -> Order {
        Order {
            id: 1,
            user_id: 1,
            shop_id,
            rider_id: None,
            product_id: 1,
            quantity: 1,
            status: OrderStatus::AwaitingMerchant,
            total_price: crate::core_types::Money::new(1000, 2),
            delivery_fee: crate::core_types::Money::new(100, 2),
            created_at: chrono::Utc::now(),
            group_id: None,
        }
    }

    #[test]
    fn ownership_check_accepts_the_owning_shop() {
        let order = sample_order(7);
        assert!(check_shop_ownership(&order, 7).is_ok());
    }

    #[test]
    fn ownership_check_rejects_a_foreign_shop() {
        let order = sample_order(7);
        let err = check_shop_ownership(&order, 8).unwrap_err();
        assert!(matches!(err, OrderError::OwnershipViolation { .. }));
    }
}
