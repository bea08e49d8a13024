//! Durable store for chat groups (C5), grounded on `database/group_db.go`'s
//! `insertGroup`: one row per order, `order_id` unique.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core_types::{GroupId, OrderId, RiderId, ShopId, UserId};
use crate::group::model::Group;
use crate::order::error::OrderError;

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Creates a group for `order_id` unless one already exists, in which
    /// case it returns the existing row (idempotent per spec.md §4.3 /
    /// invariant 3: group uniqueness).
    async fn create_once(
        &self,
        order_id: OrderId,
        user_id: UserId,
        shop_id: ShopId,
    ) -> Result<Group, OrderError>;

    async fn get_by_order(&self, order_id: OrderId) -> Result<Group, OrderError>;

    /// Looked up by the chat endpoints (spec.md §6), which address a group
    /// directly rather than through its order.
    async fn get_by_id(&self, group_id: GroupId) -> Result<Group, OrderError>;

    async fn attach_rider(&self, group_id: GroupId, rider_id: RiderId) -> Result<(), OrderError>;
}

pub struct PgGroupStore {
    pool: PgPool,
}

impl PgGroupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupStore for PgGroupStore {
    async fn create_once(
        &self,
        order_id: OrderId,
        user_id: UserId,
        shop_id: ShopId,
    ) -> Result<Group, OrderError> {
        let row = sqlx::query(
            "INSERT INTO groups (order_id, user_id, shop_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (order_id) DO UPDATE SET order_id = EXCLUDED.order_id
             RETURNING id, order_id, user_id, shop_id, rider_id",
        )
        .bind(order_id)
        .bind(user_id)
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Group {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            user_id: row.try_get("user_id")?,
            shop_id: row.try_get("shop_id")?,
            rider_id: row.try_get("rider_id")?,
        })
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<Group, OrderError> {
        let row = sqlx::query("SELECT id, order_id, user_id, shop_id, rider_id FROM groups WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Group {
                id: row.try_get("id")?,
                order_id: row.try_get("order_id")?,
                user_id: row.try_get("user_id")?,
                shop_id: row.try_get("shop_id")?,
                rider_id: row.try_get("rider_id")?,
            }),
            None => Err(OrderError::NotFound(order_id)),
        }
    }

    async fn get_by_id(&self, group_id: GroupId) -> Result<Group, OrderError> {
        let row = sqlx::query("SELECT id, order_id, user_id, shop_id, rider_id FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Group {
                id: row.try_get("id")?,
                order_id: row.try_get("order_id")?,
                user_id: row.try_get("user_id")?,
                shop_id: row.try_get("shop_id")?,
                rider_id: row.try_get("rider_id")?,
            }),
            None => Err(OrderError::NotFound(group_id)),
        }
    }

    async fn attach_rider(&self, group_id: GroupId, rider_id: RiderId) -> Result<(), OrderError> {
        sqlx::query("UPDATE groups SET rider_id = $1 WHERE id = $2")
            .bind(rider_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory fake for tests.
pub struct FakeGroupStore {
    groups: Mutex<HashMap<OrderId, Group>>,
    next_id: Mutex<GroupId>,
}

impl FakeGroupStore {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }
}

impl Default for FakeGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupStore for FakeGroupStore {
    async fn create_once(
        &self,
        order_id: OrderId,
        user_id: UserId,
        shop_id: ShopId,
    ) -> Result<Group, OrderError> {
        let mut groups = self.groups.lock().unwrap();
        if let Some(existing) = groups.get(&order_id) {
            return Ok(existing.clone());
        }
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        let group = Group {
            id,
            order_id,
            user_id,
            shop_id,
            rider_id: None,
        };
        groups.insert(order_id, group.clone());
        Ok(group)
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<Group, OrderError> {
        self.groups
            .lock()
            .unwrap()
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::NotFound(order_id))
    }

    async fn get_by_id(&self, group_id: GroupId) -> Result<Group, OrderError> {
        self.groups
            .lock()
            .unwrap()
            .values()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(OrderError::NotFound(group_id))
    }

    async fn attach_rider(&self, group_id: GroupId, rider_id: RiderId) -> Result<(), OrderError> {
        let mut groups = self.groups.lock().unwrap();
        if let Some(group) = groups.values_mut().find(|g| g.id == group_id) {
            group.rider_id = Some(rider_id);
        }
        Ok(())
    }
}
