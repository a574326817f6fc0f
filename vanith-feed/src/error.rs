use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a fetch did not produce a live snapshot
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend answered HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unexpected payload shape: {0}")]
    Shape(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport(_) => FailureKind::Transport,
            FetchError::Timeout(_) => FailureKind::Timeout,
            FetchError::Status(code) => FailureKind::Status(*code),
            FetchError::Body(_) => FailureKind::Body,
            FetchError::Malformed(_) => FailureKind::Malformed,
            FetchError::Shape(_) => FailureKind::Shape,
        }
    }
}

/// Copyable tag of a [`FetchError`], kept on fallback snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Timeout,
    Status(u16),
    Body,
    Malformed,
    Shape,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Status(code) => write!(f, "http {}", code),
            FailureKind::Body => write!(f, "body"),
            FailureKind::Malformed => write!(f, "malformed"),
            FailureKind::Shape => write!(f, "shape"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(FetchError::Status(502).kind(), FailureKind::Status(502));
        assert_eq!(FetchError::Shape("x".into()).kind(), FailureKind::Shape);
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(1)).kind(),
            FailureKind::Timeout
        );

        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(FetchError::from(parse_error).kind(), FailureKind::Malformed);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FailureKind::Status(404).to_string(), "http 404");
        assert_eq!(FailureKind::Malformed.to_string(), "malformed");
    }
}
