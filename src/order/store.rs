//! Durable store for orders (C1 slice), grounded on
//! `internal_transfer::db::TransferDb`: raw `sqlx::query`/`query_scalar`
//! (never the compile-time-checked `query!` macro), CAS updates via
//! `UPDATE ... WHERE status = $expected`, and `SELECT ... FOR UPDATE` row
//! locks for serializing concurrent actors on one order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core_types::{Money, OrderId, ProductId, RiderId, ShopId, UserId};
use crate::order::error::OrderError;
use crate::order::model::Order;
use crate::order::status::OrderStatus;

/// Storage seam for the order state machine. A trait so tests can swap in
/// an in-memory fake instead of a live Postgres instance, per the
/// "ambient singletons" redesign flag (spec.md §9).
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
        delivery_fee: Money,
    ) -> Result<Order, OrderError>;

    async fn get(&self, order_id: OrderId) -> Result<Order, OrderError>;

    /// Compare-and-swap status transition under a row lock. Returns the
    /// updated order on success, `Conflict` if the row's current status no
    /// longer matches `expected` (a concurrent actor won the race).
    async fn update_status_if(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, OrderError>;

    /// `rider_accept`'s first-writer-wins attach: succeeds only if
    /// `rider_id` is still unset and status still matches `expected`.
    async fn attach_rider(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        rider_id: RiderId,
    ) -> Result<Order, OrderError>;

    async fn set_group_id(&self, order_id: OrderId, group_id: i64) -> Result<(), OrderError>;

    /// Orders in a non-terminal status older than `older_than`, for the
    /// recovery/monitoring path (bounded by `limit`).
    async fn find_stale(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Order>, OrderError>;

    /// Deletes terminal-status orders older than `horizon` (C6). Returns
    /// the number of rows removed.
    async fn delete_terminal_older_than(&self, horizon: DateTime<Utc>) -> Result<u64, OrderError>;
}

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order, OrderError> {
        let status_id: i16 = row.try_get("status").map_err(|e| OrderError::TransientStorage(e.to_string()))?;
        let status = OrderStatus::from_id(status_id)
            .ok_or_else(|| OrderError::TransientStorage(format!("unknown status id {status_id}")))?;
        Ok(Order {
            id: row.try_get("id").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            user_id: row.try_get("user_id").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            shop_id: row.try_get("shop_id").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            rider_id: row.try_get("rider_id").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            product_id: row.try_get("product_id").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            quantity: row.try_get("quantity").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            status,
            total_price: row.try_get("total_price").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            delivery_fee: row.try_get("delivery_fee").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            created_at: row.try_get("created_at").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
            group_id: row.try_get("group_id").map_err(|e| OrderError::TransientStorage(e.to_string()))?,
        })
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
        delivery_fee: Money,
    ) -> Result<Order, OrderError> {
        let total_price = Order::compute_total(unit_price, quantity, delivery_fee);
        let row = sqlx::query(
            "INSERT INTO orders (user_id, shop_id, product_id, quantity, status, total_price, delivery_fee, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, now())
             RETURNING id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id",
        )
        .bind(user_id)
        .bind(shop_id)
        .bind(product_id)
        .bind(quantity)
        .bind(OrderStatus::AwaitingMerchant.id())
        .bind(total_price)
        .bind(delivery_fee)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(&row)
    }

    async fn get(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let row = sqlx::query(
            "SELECT id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id
             FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(&row),
            None => Err(OrderError::NotFound(order_id)),
        }
    }

    async fn update_status_if(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(locked) = locked else {
            return Err(OrderError::NotFound(order_id));
        };
        let current: i16 = locked.try_get("status").map_err(|e| OrderError::TransientStorage(e.to_string()))?;
        if current != expected.id() {
            return Err(OrderError::Conflict(order_id));
        }

        let row = sqlx::query(
            "UPDATE orders SET status = $1 WHERE id = $2 AND status = $3
             RETURNING id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id",
        )
        .bind(next.id())
        .bind(order_id)
        .bind(expected.id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(OrderError::Conflict(order_id));
        };
        tx.commit().await?;
        Self::row_to_order(&row)
    }

    async fn attach_rider(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        rider_id: RiderId,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT status, rider_id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(locked) = locked else {
            return Err(OrderError::NotFound(order_id));
        };
        let current: i16 = locked.try_get("status").map_err(|e| OrderError::TransientStorage(e.to_string()))?;
        let existing_rider: Option<RiderId> = locked.try_get("rider_id").map_err(|e| OrderError::TransientStorage(e.to_string()))?;
        if current != expected.id() || existing_rider.is_some() {
            return Err(OrderError::Conflict(order_id));
        }

        let row = sqlx::query(
            "UPDATE orders SET status = $1, rider_id = $2 WHERE id = $3 AND status = $4 AND rider_id IS NULL
             RETURNING id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id",
        )
        .bind(next.id())
        .bind(rider_id)
        .bind(order_id)
        .bind(expected.id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(OrderError::Conflict(order_id));
        };
        tx.commit().await?;
        Self::row_to_order(&row)
    }

    async fn set_group_id(&self, order_id: OrderId, group_id: i64) -> Result<(), OrderError> {
        sqlx::query("UPDATE orders SET group_id = $1 WHERE id = $2")
            .bind(group_id)
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_stale(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Order>, OrderError> {
        let rows = sqlx::query(
            "SELECT id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id
             FROM orders WHERE status NOT IN ($1, $2) AND created_at < $3
             ORDER BY created_at ASC LIMIT $4",
        )
        .bind(OrderStatus::Completed.id())
        .bind(OrderStatus::Canceled.id())
        .bind(older_than)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn delete_terminal_older_than(&self, horizon: DateTime<Utc>) -> Result<u64, OrderError> {
        let result = sqlx::query(
            "DELETE FROM orders WHERE status IN ($1, $2) AND created_at < $3",
        )
        .bind(OrderStatus::Completed.id())
        .bind(OrderStatus::Canceled.id())
        .bind(horizon)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// In-memory fake used by unit/integration tests (the teacher's
/// `MockAdapter` pattern). Not thread-parallel-correct beyond a single
/// `Mutex`, which is sufficient for deterministic test interleavings.
pub struct FakeOrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
    next_id: Mutex<OrderId>,
}

impl FakeOrderStore {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }
}

impl Default for FakeOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl FakeOrderStore {
    /// Test-only seed: inserts a `completed` order with a given id and
    /// `created_at`, for cleanup-scheduler retention tests.
    pub fn seed_terminal_at(&self, id: OrderId, created_at: DateTime<Utc>) {
        let order = Order {
            id,
            user_id: 1,
            shop_id: 1,
            rider_id: Some(1),
            product_id: 1,
            quantity: 1,
            status: OrderStatus::Completed,
            total_price: Money::from(10),
            delivery_fee: Money::from(1),
            created_at,
            group_id: Some(1),
        };
        self.orders.lock().unwrap().insert(id, order);
    }
}

#[async_trait]
impl OrderStore for FakeOrderStore {
    async fn create(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
        delivery_fee: Money,
    ) -> Result<Order, OrderError> {
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        let order = Order {
            id,
            user_id,
            shop_id,
            rider_id: None,
            product_id,
            quantity,
            status: OrderStatus::AwaitingMerchant,
            total_price: Order::compute_total(unit_price, quantity, delivery_fee),
            delivery_fee,
            created_at: Utc::now(),
            group_id: None,
        };
        self.orders.lock().unwrap().insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .lock()
            .unwrap()
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::NotFound(order_id))
    }

    async fn update_status_if(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(OrderError::NotFound(order_id))?;
        if order.status != expected {
            return Err(OrderError::Conflict(order_id));
        }
        order.status = next;
        Ok(order.clone())
    }

    async fn attach_rider(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        rider_id: RiderId,
    ) -> Result<Order, OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(OrderError::NotFound(order_id))?;
        if order.status != expected || order.rider_id.is_some() {
            return Err(OrderError::Conflict(order_id));
        }
        order.status = next;
        order.rider_id = Some(rider_id);
        Ok(order.clone())
    }

    async fn set_group_id(&self, order_id: OrderId, group_id: i64) -> Result<(), OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(OrderError::NotFound(order_id))?;
        order.group_id = Some(group_id);
        Ok(())
    }

    async fn find_stale(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Order>, OrderError> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .values()
            .filter(|o| !o.status.is_terminal() && o.created_at < older_than)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete_terminal_older_than(&self, horizon: DateTime<Utc>) -> Result<u64, OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|_, o| !(o.status.is_terminal() && o.created_at < horizon));
        Ok((before - orders.len()) as u64)
    }
}
