//! Derived-view helpers
//!
//! Pure functions the renderers compute from a snapshot on every render:
//! - Relative activity times ("45s ago")
//! - Staff roster search
//! - Animated stat counters
//! - Count and feed formatting

pub mod counter;
pub mod format;
pub mod search;
pub mod time;

pub use counter::CounterAnimation;
pub use format::{attachment_label, author_color, format_count, role_badge, truncate_text};
pub use search::filter_members;
pub use time::time_ago;
