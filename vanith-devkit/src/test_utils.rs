/*!
Test harness for the Vanith feed

Wraps a [`StubBackend`] with:
- Request-count expectations
- Header assertions on the most recent request
- Polling helpers that wait for the feed to hit the stub
*/

use crate::backend_stub::{StubBackend, StubResponse};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Full test harness around a stub backend
pub struct TestHarness {
    pub backend: StubBackend,
    expectations: Vec<Expectation>,
}

#[derive(Debug)]
struct Expectation {
    path: String,
    expected_count: usize,
}

impl TestHarness {
    /// Start a stub answering with `response`
    pub async fn new(response: StubResponse) -> Result<Self> {
        env_logger::builder().is_test(true).try_init().ok();

        Ok(Self {
            backend: StubBackend::start(response).await?,
            expectations: Vec::new(),
        })
    }

    /// Start a stub serving `payload` with status 200
    pub async fn serving(payload: Value) -> Result<Self> {
        Self::new(StubResponse::Json(payload)).await
    }

    pub fn url(&self) -> String {
        self.backend.url()
    }

    /// Expect exactly `count` requests on `path` by the time of verification
    pub fn expect_requests(&mut self, path: &str, count: usize) -> &mut Self {
        self.expectations.push(Expectation {
            path: path.to_string(),
            expected_count: count,
        });
        self
    }

    /// Wait until the stub has seen at least `count` requests
    pub async fn wait_for_requests(&self, count: usize, timeout_ms: u64) -> bool {
        let start = tokio::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if self.backend.request_count() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        log::warn!(
            "⏰ Timeout waiting for {} requests (saw {})",
            count,
            self.backend.request_count()
        );
        false
    }

    /// Check every configured expectation
    pub fn verify_expectations(&self) -> Result<()> {
        let stats = self.get_stats();

        for expectation in &self.expectations {
            let actual = stats.path_counts.get(&expectation.path).copied().unwrap_or(0);
            if actual != expectation.expected_count {
                anyhow::bail!(
                    "Expectation failed for path '{}': expected {} requests, got {}",
                    expectation.path,
                    expectation.expected_count,
                    actual
                );
            }
        }

        Ok(())
    }

    /// Assert a header value on the most recent request
    pub fn assert_header(&self, name: &str, expected: &str) -> Result<()> {
        let Some(request) = self.backend.last_request() else {
            anyhow::bail!("No request received yet");
        };

        match request.header(name) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!(
                "Header '{}' mismatch: expected {:?}, got {:?}",
                name,
                expected,
                actual
            ),
            None => anyhow::bail!("Header '{}' missing", name),
        }
    }

    /// Counts of requests received, per path
    pub fn get_stats(&self) -> TestStats {
        let requests = self.backend.requests();
        let mut path_counts = HashMap::new();

        for request in &requests {
            *path_counts.entry(request.path.clone()).or_insert(0) += 1;
        }

        TestStats {
            total_requests: requests.len(),
            path_counts,
        }
    }

    /// Reset recorded requests and expectations
    pub fn reset(&mut self) {
        self.backend.clear();
        self.expectations.clear();
    }
}

#[derive(Debug, Serialize)]
pub struct TestStats {
    pub total_requests: usize,
    pub path_counts: HashMap<String, usize>,
}
