//! Chat send/receive operation (C5's `send` operation, spec.md §4.3):
//! persist first and authoritatively, then publish best-effort.

use std::sync::Arc;

use chrono::Utc;

use crate::cache::Cache;
use crate::cache::keys::group_key;
use crate::core_types::GroupId;
use crate::message::model::{Message, SenderRole};
use crate::message::store::MessageStore;
use crate::order::error::OrderError;

pub struct ChatService {
    store: Arc<dyn MessageStore>,
    cache: Arc<Cache>,
}

impl ChatService {
    pub fn new(store: Arc<dyn MessageStore>, cache: Arc<Cache>) -> Self {
        Self { store, cache }
    }

    pub async fn send(
        &self,
        group_id: GroupId,
        sender_id: i64,
        sender_role: SenderRole,
        content: String,
    ) -> Result<Message, OrderError> {
        let message = Message {
            id: 0,
            group_id,
            sender_id,
            sender_role,
            content,
            timestamp: Utc::now(),
        };
        let saved = self.store.save(&message).await?;

        let channel = group_key(group_id);
        let payload = serde_json::to_string(&saved).unwrap_or_default();
        if let Err(err) = self.cache.publish(&channel, &payload).await {
            tracing::warn!(group_id, error = %err, "failed to publish chat message");
        }

        Ok(saved)
    }

    pub async fn list(&self, group_id: GroupId) -> Result<Vec<Message>, OrderError> {
        self.store.list_for_group(group_id).await
    }
}
