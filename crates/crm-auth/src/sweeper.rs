//! Periodic removal of expired credential records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::service::CredentialService;

/// Spawns a task that sweeps expired records every `interval`.
///
/// The first sweep runs after one full interval. The task runs until the
/// handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(service: Arc<CredentialService>, interval: Duration) -> JoinHandle<()> {
    tracing::info!(interval_secs = interval.as_secs(), "Starting credential sweeper");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match service.sweep_expired().await {
                Ok(removed) if removed > 0 => {
                    tracing::debug!(removed = removed, "Credential sweep completed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Credential sweep failed");
                }
                _ => {}
            }
        }
    })
}
