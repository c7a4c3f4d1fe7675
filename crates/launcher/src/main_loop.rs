//! Steady-state process loop.

use crate::error::LaunchResult;
use crate::services::MainLoop;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Ticks until shutdown is requested (ctrl-c by default).
pub struct SignalLoop {
    tick_interval: Duration,
    shutdown: Mutex<Option<BoxFuture<'static, ()>>>,
    ticks: AtomicU64,
}

impl SignalLoop {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            shutdown: Mutex::new(None),
            ticks: AtomicU64::new(0),
        }
    }

    /// Stop when `shutdown` resolves instead of on ctrl-c.
    pub fn with_shutdown(
        tick_interval: Duration,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Self {
        Self {
            tick_interval,
            shutdown: Mutex::new(Some(Box::pin(shutdown))),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c, stopping");
    }
}

#[async_trait]
impl MainLoop for SignalLoop {
    async fn start(&self) -> LaunchResult<()> {
        let shutdown = match self.shutdown.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let mut shutdown = shutdown.unwrap_or_else(|| Box::pin(ctrl_c()));

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!("Main loop started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::trace!(tick, "Main loop tick");
                }
            }
        }

        tracing::info!(ticks = self.ticks(), "Main loop stopped");
        Ok(())
    }
}
