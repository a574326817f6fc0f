//! Polling loop
//!
//! Fetches once on start, then on every tick of a fixed period. Each fetch
//! runs in its own task so a slow backend never holds up the next tick;
//! results are published from the loop task only, newest cycle wins.

use crate::client::{FetchOutcome, SnapshotSource};
use crate::store::{Published, SnapshotStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shortest accepted poll period; shorter ones are raised to it
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Poller<S: SnapshotSource> {
    source: Arc<S>,
    period: Duration,
    store: SnapshotStore,
    running: Option<RunningLoop>,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(source: S, period: Duration) -> Self {
        if period < MIN_PERIOD {
            warn!("Poll period {:?} too short, using {:?}", period, MIN_PERIOD);
        }

        Self {
            source: Arc::new(source),
            period: period.max(MIN_PERIOD),
            store: SnapshotStore::new(),
            running: None,
        }
    }

    /// Publish into an existing store instead of a private one
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> PollerState {
        if self.running.is_some() {
            PollerState::Running
        } else {
            PollerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }

    /// Stopped -> Running. `on_update` sees every accepted snapshot;
    /// `on_error` fires when a fetch task dies before returning one.
    pub fn start<U, E>(&mut self, on_update: U, on_error: E)
    where
        U: Fn(&Published) + Send + 'static,
        E: Fn() + Send + 'static,
    {
        if self.running.is_some() {
            warn!("Polling loop already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.source.clone(),
            self.period,
            self.store.clone(),
            cancel.clone(),
            on_update,
            on_error,
        ));

        info!("Polling loop started (every {}s)", self.period.as_secs());
        self.running = Some(RunningLoop { cancel, handle });
    }

    /// Running -> Stopped. Once this returns nothing else is published
    /// and the store is empty again.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            error!("Polling loop ended abnormally: {}", e);
        }

        self.store.clear();
        info!("Polling loop stopped");
    }
}

impl<S: SnapshotSource> Drop for Poller<S> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }
}

async fn run_loop<S, U, E>(
    source: Arc<S>,
    period: Duration,
    store: SnapshotStore,
    cancel: CancellationToken,
    on_update: U,
    on_error: E,
) where
    S: SnapshotSource,
    U: Fn(&Published),
    E: Fn(),
{
    // first tick completes immediately
    let mut ticker = tokio::time::interval(period);
    let mut in_flight: JoinSet<(u64, FetchOutcome)> = JoinSet::new();
    let mut next_cycle = 0u64;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(joined) = in_flight.join_next() => match joined {
                Ok((cycle, outcome)) => {
                    let published = Published::new(cycle, outcome);
                    if store.publish(published.clone()) {
                        debug!(cycle, fallback = published.last_attempt_failed(), "snapshot published");
                        on_update(&published);
                    } else {
                        debug!(cycle, "discarding result older than the published snapshot");
                    }
                }
                Err(e) => {
                    error!("Fetch task failed: {}", e);
                    on_error();
                }
            },

            _ = ticker.tick() => {
                next_cycle += 1;
                let cycle = next_cycle;
                let source = source.clone();
                debug!(cycle, "poll tick");
                in_flight.spawn(async move { (cycle, source.fetch().await) });
            }
        }
    }

    in_flight.shutdown().await;
}
