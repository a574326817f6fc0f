use crate::models::Activity;
use chrono::{DateTime, Utc};

/// Coarse relative time: seconds under a minute, minutes under an hour,
/// hours beyond. Instants in the future read as `0s ago`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return format!("{}s ago", seconds);
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    format!("{}h ago", minutes / 60)
}

impl Activity {
    /// `None` when the backend sent an unparseable time
    pub fn time_ago(&self, now: DateTime<Utc>) -> Option<String> {
        self.occurred_at().map(|then| time_ago(then, now))
    }
}
