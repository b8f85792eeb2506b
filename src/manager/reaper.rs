//! Background idle sweep.
//!
//! Periodically unloads unreferenced models that have sat idle past the
//! threshold, independent of budget pressure.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::ModelManager;

/// Interval and idle threshold for the reaper task.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    pub interval: Duration,
    pub idle_threshold: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            idle_threshold: Duration::from_secs(300),
        }
    }
}

/// Spawn the reaper loop. Cancel `shutdown` to stop it.
pub fn spawn_idle_reaper<H>(
    manager: ModelManager<H>,
    config: ReaperConfig,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    H: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be idle yet.
        ticker.tick().await;

        tracing::debug!(
            interval_secs = config.interval.as_secs(),
            idle_threshold_secs = config.idle_threshold.as_secs(),
            "idle reaper started"
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::info!("idle reaper: shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    manager.sweep_idle(config.idle_threshold).await;
                }
            }
        }
    })
}
