//! Vanith community feed
//!
//! Polls the community backend for a full server snapshot (stats, activity
//! feed, channels, roles, staff) and keeps the latest one available to
//! renderers. Failed fetches degrade to a fixed placeholder snapshot.

pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod normalize;
pub mod poller;
pub mod render;
pub mod store;
pub mod views;

pub use client::{DataClient, FetchOutcome, Fetched, Origin, SnapshotSource};
pub use config::FeedConfig;
pub use error::{FailureKind, FetchError};
pub use fallback::fallback_snapshot;
pub use models::Snapshot;
pub use poller::{Poller, PollerState};
pub use render::{hero_line, render_page, RenderOptions};
pub use store::{Published, SnapshotStore};
