//! Periodic and on-demand scan triggering.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::ScanOrchestrator;

/// Handle for requesting scans. Cheap to clone.
#[derive(Clone)]
pub struct ScanTrigger {
    orchestrator: Arc<ScanOrchestrator>,
    manual: Arc<Notify>,
}

impl ScanTrigger {
    pub fn new(orchestrator: Arc<ScanOrchestrator>) -> Self {
        Self {
            orchestrator,
            manual: Arc::new(Notify::new()),
        }
    }

    pub fn orchestrator(&self) -> &Arc<ScanOrchestrator> {
        &self.orchestrator
    }

    /// Start a cycle now. Returns false if one was already running, in which
    /// case nothing is queued.
    pub fn trigger(&self, force: bool) -> bool {
        match self.orchestrator.spawn_cycle(force) {
            Some(_) => {
                self.manual.notify_one();
                true
            }
            None => false,
        }
    }
}

/// Runs a scan at startup and then every `interval`.
pub struct ScanScheduler;

impl ScanScheduler {
    /// Spawn the scheduling loop. A `None` interval disables periodic scans;
    /// only the startup scan and manual triggers run.
    ///
    /// A manual trigger restarts the interval so a periodic scan does not
    /// follow right behind it.
    pub fn spawn(
        trigger: ScanTrigger,
        interval: Option<Duration>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let orchestrator = Arc::clone(trigger.orchestrator());
            if orchestrator.spawn_cycle(false).is_none() {
                tracing::debug!("Startup scan skipped, a scan is already running");
            }

            match interval {
                Some(period) => {
                    tracing::info!(interval_secs = period.as_secs(), "Periodic scans enabled");
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                    loop {
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = trigger.manual.notified() => {
                                ticker.reset();
                            }
                            _ = ticker.tick() => {
                                if orchestrator.spawn_cycle(false).is_none() {
                                    tracing::debug!("Periodic scan skipped, previous scan still running");
                                }
                            }
                        }
                    }
                }
                None => {
                    tracing::info!("Periodic scans disabled");
                    shutdown.cancelled().await;
                }
            }

            tracing::info!("Scan scheduler stopping, waiting for running scan");
            orchestrator.wait_idle().await;
        })
    }
}
