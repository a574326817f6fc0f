//! Data client for the community backend
//!
//! Issues one GET per call against the configured endpoint and turns the
//! answer into a [`Snapshot`]. `try_fetch` surfaces every failure;
//! `fetch` absorbs them and hands back the fallback snapshot instead.

use crate::config::ApiConfig;
use crate::error::{FailureKind, FetchError};
use crate::fallback::fallback_snapshot;
use crate::models::Snapshot;
use crate::normalize::{normalize, Repair};
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const SKIP_BROWSER_WARNING: &str = "ngrok-skip-browser-warning";

/// A live snapshot with the repairs made while parsing it
#[derive(Debug, Clone)]
pub struct Fetched {
    pub snapshot: Arc<Snapshot>,
    pub repairs: Vec<Repair>,
}

/// Where a published snapshot came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Live { repairs: Vec<Repair> },
    Fallback { reason: FailureKind },
}

/// Result of one fetch attempt; always carries a renderable snapshot
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub snapshot: Arc<Snapshot>,
    pub origin: Origin,
}

impl FetchOutcome {
    pub fn live(fetched: Fetched) -> Self {
        Self {
            snapshot: fetched.snapshot,
            origin: Origin::Live { repairs: fetched.repairs },
        }
    }

    pub fn fallback(reason: FailureKind) -> Self {
        Self {
            snapshot: fallback_snapshot(),
            origin: Origin::Fallback { reason },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback { .. })
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.origin {
            Origin::Fallback { reason } => Some(reason),
            Origin::Live { .. } => None,
        }
    }
}

/// Anything the polling loop can pull snapshots from
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = FetchOutcome> + Send;
}

/// HTTP client bound to one backend endpoint
#[derive(Debug, Clone)]
pub struct DataClient {
    http: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl DataClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let url = reqwest::Url::parse(&config.url)
            .with_context(|| format!("Invalid backend URL: {}", config.url))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        if config.skip_browser_warning {
            headers.insert(
                HeaderName::from_static(SKIP_BROWSER_WARNING),
                HeaderValue::from_static("true"),
            );
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            url,
            timeout: config.timeout(),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// One GET, surfacing every failure
    pub async fn try_fetch(&self) -> Result<Fetched, FetchError> {
        debug!(url = %self.url, "fetching snapshot");

        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e, FetchError::Transport))?;

        let status = response.status();
        debug!(status = status.as_u16(), "backend responded");
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.classify(e, FetchError::Body))?;
        let payload: serde_json::Value = serde_json::from_str(&body)?;
        let (snapshot, repairs) = normalize(payload, Utc::now())?;

        debug!(
            activities = snapshot.activities.len(),
            members = snapshot.staff.members.len(),
            repairs = repairs.len(),
            "snapshot parsed"
        );

        Ok(Fetched {
            snapshot: Arc::new(snapshot),
            repairs,
        })
    }

    /// One GET; failures degrade to the fallback snapshot
    pub async fn fetch(&self) -> FetchOutcome {
        match self.try_fetch().await {
            Ok(fetched) => FetchOutcome::live(fetched),
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "Failed to fetch community data");
                info!("Using fallback snapshot");
                FetchOutcome::fallback(e.kind())
            }
        }
    }

    /// Snapshot only, live or fallback
    pub async fn fetch_snapshot(&self) -> Arc<Snapshot> {
        self.fetch().await.snapshot
    }

    fn classify(&self, e: reqwest::Error, otherwise: fn(reqwest::Error) -> FetchError) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            otherwise(e)
        }
    }
}

impl SnapshotSource for DataClient {
    fn fetch(&self) -> impl Future<Output = FetchOutcome> + Send {
        DataClient::fetch(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vanith_devkit::fixtures::{sample_payload, PayloadBuilder};
    use vanith_devkit::{StubBackend, StubResponse, TestHarness};

    fn client_for(url: &str) -> DataClient {
        let config = ApiConfig {
            url: url.to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        DataClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_live_fetch() {
        let harness = TestHarness::serving(sample_payload()).await.unwrap();
        let client = client_for(&harness.url());

        let outcome = client.fetch().await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.origin, Origin::Live { repairs: vec![] });
        assert_eq!(outcome.snapshot.stats.total_members, 12_847);
        assert_eq!(outcome.snapshot.staff.owner[0].display_name, "Vanith");
    }

    #[tokio::test]
    async fn test_request_headers() {
        let harness = TestHarness::serving(sample_payload()).await.unwrap();
        client_for(&harness.url()).fetch().await;

        let request = harness.backend.last_request().unwrap();
        assert_eq!(request.method, "GET");
        harness.assert_header("accept", "application/json").unwrap();
        harness.assert_header("user-agent", "VanithWebsite/1.0").unwrap();
        harness.assert_header(SKIP_BROWSER_WARNING, "true").unwrap();
        harness.assert_header("cache-control", "no-cache").unwrap();
        harness.assert_header("pragma", "no-cache").unwrap();
    }

    #[tokio::test]
    async fn test_warning_header_can_be_disabled() {
        let harness = TestHarness::serving(sample_payload()).await.unwrap();
        let config = ApiConfig {
            url: harness.url(),
            skip_browser_warning: false,
            ..ApiConfig::default()
        };
        DataClient::new(&config).unwrap().fetch().await;

        let request = harness.backend.last_request().unwrap();
        assert!(request.header(SKIP_BROWSER_WARNING).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_backend_falls_back() {
        let url = StubBackend::unreachable_url().await.unwrap();
        let client = client_for(&url);

        assert!(matches!(client.try_fetch().await, Err(FetchError::Transport(_))));

        let outcome = client.fetch().await;
        assert_eq!(outcome.failure(), Some(FailureKind::Transport));
        assert!(Arc::ptr_eq(&outcome.snapshot, &fallback_snapshot()));
    }

    #[tokio::test]
    async fn test_error_status_falls_back() {
        let harness = TestHarness::new(StubResponse::Status(503)).await.unwrap();
        let client = client_for(&harness.url());

        let outcome = client.fetch().await;
        assert_eq!(outcome.failure(), Some(FailureKind::Status(503)));
        assert_eq!(*outcome.snapshot, *fallback_snapshot());
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back() {
        let harness = TestHarness::new(StubResponse::Raw {
            status: 200,
            body: "<html>tunnel offline</html>".to_string(),
        })
        .await
        .unwrap();

        let outcome = client_for(&harness.url()).fetch().await;
        assert_eq!(outcome.failure(), Some(FailureKind::Malformed));
    }

    #[tokio::test]
    async fn test_shape_mismatch_falls_back() {
        let payload = PayloadBuilder::new().without("stats").build();
        let harness = TestHarness::serving(payload).await.unwrap();

        let outcome = client_for(&harness.url()).fetch().await;
        assert_eq!(outcome.failure(), Some(FailureKind::Shape));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let harness = TestHarness::new(StubResponse::delayed(
            Duration::from_secs(5),
            StubResponse::Json(sample_payload()),
        ))
        .await
        .unwrap();
        let client = client_for(&harness.url());

        let outcome = client.fetch().await;
        assert_eq!(outcome.failure(), Some(FailureKind::Timeout));
    }

    #[tokio::test]
    async fn test_missing_members_repaired_not_failed() {
        let payload = PayloadBuilder::new().without("staff.members").build();
        let harness = TestHarness::serving(payload).await.unwrap();

        let outcome = client_for(&harness.url()).fetch().await;
        assert!(!outcome.is_fallback());
        assert!(outcome.snapshot.staff.members.is_empty());
        assert_eq!(
            outcome.origin,
            Origin::Live { repairs: vec![Repair::Missing("staff.members".into())] }
        );
    }

    #[tokio::test]
    async fn test_repeated_fetch_is_idempotent() {
        let payload = PayloadBuilder::new().without("timestamp").build();
        let harness = TestHarness::serving(payload).await.unwrap();
        let client = client_for(&harness.url());

        let first = client.fetch_snapshot().await;
        let second = client.fetch_snapshot().await;
        assert!(first.same_content(&second));
        assert_eq!(harness.backend.request_count(), 2);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = ApiConfig {
            url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(DataClient::new(&config).is_err());
    }
}
