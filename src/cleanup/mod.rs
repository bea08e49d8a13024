//! Cleanup Scheduler (C6, spec.md §4.5): a periodic background task
//! purging terminal-state orders and their messages older than a retention
//! horizon. Grounded on the teacher's `transfer::worker` periodic-scan
//! shape — a `run() -> !` loop around a testable `run_once`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::CleanupConfig;
use crate::message::store::MessageStore;
use crate::order::store::OrderStore;

pub struct CleanupScheduler {
    orders: Arc<dyn OrderStore>,
    messages: Arc<dyn MessageStore>,
    config: CleanupConfig,
}

/// Per-run outcome, logged and also useful to tests (invariant 7: no row
/// older than the retention horizon survives a run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub orders_deleted: u64,
    pub messages_deleted: u64,
}

impl CleanupScheduler {
    pub fn new(orders: Arc<dyn OrderStore>, messages: Arc<dyn MessageStore>, config: CleanupConfig) -> Self {
        Self {
            orders,
            messages,
            config,
        }
    }

    /// Runs forever on `config.interval`, never blocking foreground
    /// traffic — failures are logged and the loop continues on the next
    /// tick rather than propagating (spec.md §4.5).
    pub async fn run(self: Arc<Self>) -> ! {
        let mut ticker = tokio::time::interval(self.config.interval);
        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(report) => tracing::info!(
                    orders_deleted = report.orders_deleted,
                    messages_deleted = report.messages_deleted,
                    "cleanup run completed"
                ),
                Err(err) => tracing::error!(error = %err, "cleanup run failed"),
            }
        }
    }

    /// One cleanup pass: ranged deletes against orders and messages older
    /// than the retention horizon. Deletes are idempotent — a row already
    /// gone is not an error.
    pub async fn run_once(&self) -> Result<CleanupReport, CleanupError> {
        let horizon = Utc::now() - self.config.retention_chrono();

        let orders_deleted = self
            .orders
            .delete_terminal_older_than(horizon)
            .await
            .map_err(|e| CleanupError(e.to_string()))?;
        let messages_deleted = self
            .messages
            .delete_older_than(horizon)
            .await
            .map_err(|e| CleanupError(e.to_string()))?;

        Ok(CleanupReport {
            orders_deleted,
            messages_deleted,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cleanup run failed: {0}")]
pub struct CleanupError(String);

impl CleanupConfig {
    fn retention_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.retention).unwrap_or_else(|_| chrono::Duration::days(14))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::store::FakeMessageStore;
    use crate::order::store::FakeOrderStore;

    #[tokio::test]
    async fn run_once_purges_only_old_terminal_rows() {
        let orders = Arc::new(FakeOrderStore::new());
        let messages = Arc::new(FakeMessageStore::new());

        orders.seed_terminal_at(1, Utc::now() - chrono::Duration::days(15));
        orders.seed_terminal_at(2, Utc::now() - chrono::Duration::days(8));

        let scheduler = CleanupScheduler::new(
            orders.clone(),
            messages,
            CleanupConfig {
                interval: Duration::from_secs(1),
                retention: Duration::from_secs(14 * 24 * 3600),
            },
        );

        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.orders_deleted, 1);
        assert!(orders.get(2).await.is_ok());
        assert!(orders.get(1).await.is_err());
    }
}
