//! Chat Group Provisioner (C5): fetches the per-order group and writes
//! through to the cache hash — grounded on `database/group_db.go`. The
//! group row itself is created/updated as part of the order transaction
//! (`order::transactions`); this type owns only the read path and the
//! cache projection.

use std::sync::Arc;

use crate::cache::Cache;
use crate::cache::keys::group_key;
use crate::core_types::OrderId;
use crate::group::model::Group;
use crate::group::store::GroupStore;
use crate::order::error::OrderError;

pub struct ChatGroupProvisioner {
    store: Arc<dyn GroupStore>,
    cache: Arc<Cache>,
}

impl ChatGroupProvisioner {
    pub fn new(store: Arc<dyn GroupStore>, cache: Arc<Cache>) -> Self {
        Self { store, cache }
    }

    pub async fn get_by_order(&self, order_id: OrderId) -> Result<Group, OrderError> {
        self.store.get_by_order(order_id).await
    }

    pub async fn get_by_id(&self, group_id: crate::core_types::GroupId) -> Result<Group, OrderError> {
        self.store.get_by_id(group_id).await
    }

    /// Pushes a group row already committed elsewhere into the cache hash.
    /// Best-effort: a failed cache write is logged, never fails the caller,
    /// per C7's policy (spec.md §4.6).
    pub async fn populate_cache(&self, group: &Group) {
        let key = group_key(group.id);
        let fields: Vec<(&str, String)> = vec![
            ("order_id", group.order_id.to_string()),
            ("user_id", group.user_id.to_string()),
            ("shop_id", group.shop_id.to_string()),
            (
                "rider_id",
                group.rider_id.map(|r| r.to_string()).unwrap_or_default(),
            ),
        ];
        if let Err(err) = self.cache.hset_multiple(&key, &fields).await {
            tracing::warn!(group_id = group.id, error = %err, "cache write-through failed for group");
        }
    }
}
