use crate::client::{FetchOutcome, Origin};
use crate::error::FailureKind;
use crate::models::Snapshot;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// A snapshot as handed to consumers
#[derive(Debug, Clone)]
pub struct Published {
    pub snapshot: Arc<Snapshot>,
    /// Poll cycle that produced it, starting at 1
    pub cycle: u64,
    pub origin: Origin,
    pub received_at: DateTime<Utc>,
}

impl Published {
    pub fn new(cycle: u64, outcome: FetchOutcome) -> Self {
        Self {
            snapshot: outcome.snapshot,
            cycle,
            origin: outcome.origin,
            received_at: Utc::now(),
        }
    }

    /// True when the attempt behind this snapshot fell back to placeholders
    pub fn last_attempt_failed(&self) -> bool {
        matches!(self.origin, Origin::Fallback { .. })
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.origin {
            Origin::Fallback { reason } => Some(reason),
            Origin::Live { .. } => None,
        }
    }
}

/// Holder of the current snapshot; `None` until the first publish
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<Option<Published>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current snapshot unless it comes from an older cycle.
    /// Returns whether it was accepted.
    pub fn publish(&self, published: Published) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(existing) if existing.cycle >= published.cycle => false,
            _ => {
                *current = Some(published);
                true
            }
        })
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn latest(&self) -> Option<Published> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Published>> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(cycle: u64) -> Published {
        Published::new(cycle, FetchOutcome::fallback(FailureKind::Transport))
    }

    #[test]
    fn test_empty_until_published() {
        let store = SnapshotStore::new();
        assert!(store.latest().is_none());

        assert!(store.publish(published(1)));
        let latest = store.latest().unwrap();
        assert_eq!(latest.cycle, 1);
        assert!(latest.last_attempt_failed());
        assert_eq!(latest.failure(), Some(FailureKind::Transport));
    }

    #[test]
    fn test_older_cycle_is_rejected() {
        let store = SnapshotStore::new();
        assert!(store.publish(published(3)));
        assert!(!store.publish(published(2)));
        assert!(!store.publish(published(3)));
        assert_eq!(store.latest().unwrap().cycle, 3);
    }

    #[test]
    fn test_clear_resets() {
        let store = SnapshotStore::new();
        store.publish(published(5));
        store.clear();
        assert!(store.latest().is_none());
        assert!(store.publish(published(1)));
    }

    #[tokio::test]
    async fn test_subscribers_see_replacements() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();

        store.publish(published(1));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|p| p.cycle), Some(1));

        store.publish(published(2));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|p| p.cycle), Some(2));
    }
}
