//! Durable store for chat messages, grounded on `database/message_db.go`'s
//! `SaveMessage`. Messages are totally ordered within a group by
//! `(timestamp, id)` (spec.md §3, invariant 6).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core_types::GroupId;
use crate::message::model::{Message, SenderRole};
use crate::order::error::OrderError;

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn save(&self, message: &Message) -> Result<Message, OrderError>;

    async fn list_for_group(&self, group_id: GroupId) -> Result<Vec<Message>, OrderError>;

    /// Ranged delete for the Cleanup Scheduler (C6).
    async fn delete_older_than(&self, horizon: DateTime<Utc>) -> Result<u64, OrderError>;
}

pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn role_str(role: SenderRole) -> &'static str {
    match role {
        SenderRole::User => "user",
        SenderRole::Shop => "shop",
        SenderRole::Rider => "rider",
    }
}

fn role_from_str(s: &str) -> Option<SenderRole> {
    match s {
        "user" => Some(SenderRole::User),
        "shop" => Some(SenderRole::Shop),
        "rider" => Some(SenderRole::Rider),
        _ => None,
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn save(&self, message: &Message) -> Result<Message, OrderError> {
        let row = sqlx::query(
            "INSERT INTO messages (group_id, sender_id, sender_role, content, timestamp)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, group_id, sender_id, sender_role, content, timestamp",
        )
        .bind(message.group_id)
        .bind(message.sender_id)
        .bind(role_str(message.sender_role))
        .bind(&message.content)
        .bind(message.timestamp)
        .fetch_one(&self.pool)
        .await?;

        let role_str: String = row.try_get("sender_role")?;
        Ok(Message {
            id: row.try_get("id")?,
            group_id: row.try_get("group_id")?,
            sender_id: row.try_get("sender_id")?,
            sender_role: role_from_str(&role_str).unwrap_or(SenderRole::User),
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    async fn list_for_group(&self, group_id: GroupId) -> Result<Vec<Message>, OrderError> {
        let rows = sqlx::query(
            "SELECT id, group_id, sender_id, sender_role, content, timestamp FROM messages
             WHERE group_id = $1 ORDER BY timestamp ASC, id ASC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let role_str: String = row.try_get("sender_role")?;
                Ok(Message {
                    id: row.try_get("id")?,
                    group_id: row.try_get("group_id")?,
                    sender_id: row.try_get("sender_id")?,
                    sender_role: role_from_str(&role_str).unwrap_or(SenderRole::User),
                    content: row.try_get("content")?,
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(OrderError::from)
    }

    async fn delete_older_than(&self, horizon: DateTime<Utc>) -> Result<u64, OrderError> {
        let result = sqlx::query("DELETE FROM messages WHERE timestamp < $1")
            .bind(horizon)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// In-memory fake for tests.
pub struct FakeMessageStore {
    messages: Mutex<HashMap<GroupId, Vec<Message>>>,
    next_id: Mutex<i64>,
}

impl FakeMessageStore {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }
}

impl Default for FakeMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for FakeMessageStore {
    async fn save(&self, message: &Message) -> Result<Message, OrderError> {
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        let mut saved = message.clone();
        saved.id = id;
        self.messages
            .lock()
            .unwrap()
            .entry(message.group_id)
            .or_default()
            .push(saved.clone());
        Ok(saved)
    }

    async fn list_for_group(&self, group_id: GroupId) -> Result<Vec<Message>, OrderError> {
        let mut msgs = self
            .messages
            .lock()
            .unwrap()
            .get(&group_id)
            .cloned()
            .unwrap_or_default();
        msgs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(msgs)
    }

    async fn delete_older_than(&self, horizon: DateTime<Utc>) -> Result<u64, OrderError> {
        let mut messages = self.messages.lock().unwrap();
        let mut removed = 0u64;
        for msgs in messages.values_mut() {
            let before = msgs.len();
            msgs.retain(|m| m.timestamp >= horizon);
            removed += (before - msgs.len()) as u64;
        }
        Ok(removed)
    }
}
