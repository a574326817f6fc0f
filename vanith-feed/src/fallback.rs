//! Placeholder snapshot served when live data cannot be fetched

use crate::models::{ServerStats, Snapshot, StaffRoster};
use chrono::Utc;
use std::sync::{Arc, OnceLock};

pub const FALLBACK_STATS: ServerStats = ServerStats {
    total_members: 12_847,
    online_members: 3_456,
    messages_today: 8_923,
};

static FALLBACK: OnceLock<Arc<Snapshot>> = OnceLock::new();

/// The fixed fallback; built on first use, identical for the rest of the process
pub fn fallback_snapshot() -> Arc<Snapshot> {
    FALLBACK
        .get_or_init(|| {
            Arc::new(Snapshot {
                stats: FALLBACK_STATS,
                activities: Vec::new(),
                channels: Vec::new(),
                roles: Vec::new(),
                staff: StaffRoster::default(),
                timestamp: Utc::now().to_rfc3339(),
            })
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_stable() {
        let first = fallback_snapshot();
        let second = fallback_snapshot();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.timestamp, second.timestamp);
    }

    #[test]
    fn test_fallback_content() {
        let snapshot = fallback_snapshot();
        assert_eq!(snapshot.stats, FALLBACK_STATS);
        assert!(snapshot.activities.is_empty());
        assert!(snapshot.channels.is_empty());
        assert!(snapshot.roles.is_empty());
        assert_eq!(snapshot.staff.total(), 0);
    }
}
