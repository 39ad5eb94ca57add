//! Background task that periodically sweeps overdue receivables.
//!
//! Runs in a tokio::spawn loop, checking every `check_interval_secs` for
//! Pending receivables past their due date and settling them as failed,
//! which cancels the reservation and releases the room.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::application::ledger::ReceivableLedger;
use crate::domain::DomainError;
use crate::shared::retry::{retry_with_backoff, RetryConfig};
use crate::shared::shutdown::ShutdownSignal;

pub fn start_overdue_sweep_task(
    ledger: Arc<ReceivableLedger>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
    retry: RetryConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!(check_interval = check_interval_secs, "📅 Overdue sweep task started");

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = run_sweep(&ledger, &retry).await {
                        warn!(error = %e, "Overdue sweep error");
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("📅 Overdue sweep task shutting down");
                    break;
                }
            }
        }

        info!("📅 Overdue sweep task stopped");
    })
}

/// One sweep pass, retrying transient storage failures.
pub async fn run_sweep(ledger: &ReceivableLedger, retry: &RetryConfig) -> Result<usize, DomainError> {
    let swept = retry_with_backoff(
        retry,
        || ledger.sweep_overdue(Utc::now().date_naive()),
        DomainError::is_transient,
        "overdue_sweep",
    )
    .await?;
    if swept > 0 {
        info!(count = swept, "Overdue receivables swept");
    }
    Ok(swept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::lifecycle::RoomLocks;
    use crate::infrastructure::storage::InMemoryStore;

    #[tokio::test]
    async fn empty_ledger_sweeps_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = ReceivableLedger::new(store, create_event_bus(), RoomLocks::new(), 3);
        assert_eq!(run_sweep(&ledger, &RetryConfig::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn task_stops_on_shutdown() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(ReceivableLedger::new(store, create_event_bus(), RoomLocks::new(), 3));
        let shutdown = ShutdownSignal::new();
        let handle = start_overdue_sweep_task(ledger, shutdown.clone(), 3600, RetryConfig::default());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep task should stop")
            .unwrap();
    }
}
