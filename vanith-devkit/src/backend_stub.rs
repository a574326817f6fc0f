/*!
Stub backend for development without the real community API

Serves `/api/all` from a local axum server bound to an ephemeral port.
Every incoming request is recorded so tests can assert on headers and counts,
and the canned response can be swapped between calls.
*/

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Path the feed polls on the real backend
pub const API_PATH: &str = "/api/all";

/// What the stub answers on the next request
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// 200 with a JSON body
    Json(Value),
    /// Empty body with the given status
    Status(u16),
    /// Arbitrary body text with the given status (for malformed payloads)
    Raw { status: u16, body: String },
    /// Sleep, then answer with the inner response
    Delayed(Duration, Box<StubResponse>),
}

impl StubResponse {
    pub fn delayed(delay: Duration, inner: StubResponse) -> Self {
        StubResponse::Delayed(delay, Box::new(inner))
    }
}

/// A request as seen by the stub
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub received_at: DateTime<Utc>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }
}

#[derive(Clone)]
struct StubState {
    response: Arc<Mutex<StubResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Local HTTP server standing in for the community backend
pub struct StubBackend {
    addr: SocketAddr,
    state: StubState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubBackend {
    /// Bind on 127.0.0.1 with an ephemeral port and start serving
    pub async fn start(response: StubResponse) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = StubState {
            response: Arc::new(Mutex::new(response)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route(API_PATH, get(serve_payload))
            .fallback(serve_unknown)
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                log::warn!("⚠️ [STUB] Server stopped with error: {}", e);
            }
        });

        log::info!("📡 [STUB] Backend listening on http://{}", addr);
        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Convenience: serve a JSON payload with status 200
    pub async fn serving(payload: Value) -> Result<Self> {
        Self::start(StubResponse::Json(payload)).await
    }

    /// Full URL of the polled endpoint
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, API_PATH)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Replace the canned response for subsequent requests
    pub fn set_response(&self, response: StubResponse) {
        *self.state.response.lock() = response;
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.state.requests.lock().clear();
    }

    /// URL on a port nothing listens on (connection refused)
    pub async fn unreachable_url() -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        Ok(format!("http://{}{}", addr, API_PATH))
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn record(state: &StubState, method: &Method, uri: &Uri, headers: &HeaderMap) {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        received_at: Utc::now(),
    });
}

async fn serve_payload(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers);
    log::info!("📥 [STUB] {} {}", method, uri.path());

    let mut response = state.response.lock().clone();
    while let StubResponse::Delayed(delay, inner) = response {
        tokio::time::sleep(delay).await;
        response = *inner;
    }

    match response {
        StubResponse::Json(payload) => Json(payload).into_response(),
        StubResponse::Status(code) => status_code(code).into_response(),
        StubResponse::Raw { status, body } => (status_code(status), body).into_response(),
        StubResponse::Delayed(..) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn serve_unknown(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    record(&state, &method, &uri, &headers);
    log::warn!("⚠️ [STUB] Unexpected request {} {}", method, uri.path());
    StatusCode::NOT_FOUND
}

fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
