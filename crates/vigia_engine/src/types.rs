//! Shared engine types: page references, queue snapshots, and host errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of an open queue page, derived from its resolved URL.
pub type PageId = u64;

/// One candidate page reported by a [`QueueHost`](crate::QueueHost) during
/// discovery. The `url` keeps the view fragment when the page currently
/// renders the queue view, so candidate selection can prefer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: PageId,
    pub url: String,
}

/// Whether the document queue currently holds anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Empty,
    NotEmpty,
}

/// Result of inspecting the queue table once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub state: QueueState,
    pub count: u32,
}

impl QueueSnapshot {
    /// Snapshot reported when the page is unreachable or shows no rows.
    pub fn empty() -> Self {
        Self {
            state: QueueState::Empty,
            count: 0,
        }
    }

    pub fn from_count(count: u32) -> Self {
        let state = if count == 0 {
            QueueState::Empty
        } else {
            QueueState::NotEmpty
        };
        Self { state, count }
    }
}

/// Outcome of one full probe: which page was inspected (if any) and what
/// the queue looked like. A probe never fails; degraded outcomes collapse
/// into `page: None` or an empty snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub page: Option<PageRef>,
    pub snapshot: QueueSnapshot,
}

impl ProbeReport {
    /// Report for a probe that found no queue page at all.
    pub fn absent() -> Self {
        Self {
            page: None,
            snapshot: QueueSnapshot::empty(),
        }
    }
}

/// Error information for a failed host operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub kind: HostFailure,
    pub message: String,
}

impl HostError {
    pub(crate) fn new(kind: HostFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HostError {}

/// Classification of host failures, for logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFailure {
    /// The configured target URL does not parse.
    InvalidUrl,
    /// The request timed out (connect or total).
    Timeout,
    /// TCP/TLS connection could not be established.
    Connect,
    /// The redirect limit was exceeded.
    Redirect,
    /// The server answered with a non-success status.
    Http { status: u16 },
    /// The response body exceeded the configured size cap.
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// The response is not an HTML document.
    UnsupportedContentType { content_type: String },
    /// The response bytes could not be decoded as text.
    Decode,
    /// Any other transport-level failure.
    Other,
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFailure::InvalidUrl => write!(f, "invalid url"),
            HostFailure::Timeout => write!(f, "timeout"),
            HostFailure::Connect => write!(f, "connection failed"),
            HostFailure::Redirect => write!(f, "too many redirects"),
            HostFailure::Http { status } => write!(f, "http status {status}"),
            HostFailure::TooLarge { max_bytes, actual } => match actual {
                Some(actual) => {
                    write!(f, "response too large ({actual} bytes, cap {max_bytes})")
                }
                None => write!(f, "response exceeds {max_bytes} bytes"),
            },
            HostFailure::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type:?}")
            }
            HostFailure::Decode => write!(f, "decode failure"),
            HostFailure::Other => write!(f, "request failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_from_count_classifies_state() {
        assert_eq!(QueueSnapshot::from_count(0).state, QueueState::Empty);
        assert_eq!(QueueSnapshot::from_count(1).state, QueueState::NotEmpty);
        assert_eq!(QueueSnapshot::from_count(7).count, 7);
    }

    #[test]
    fn failure_display_is_compact() {
        assert_eq!(
            HostFailure::Http { status: 503 }.to_string(),
            "http status 503"
        );
        assert_eq!(
            HostFailure::TooLarge {
                max_bytes: 100,
                actual: Some(250)
            }
            .to_string(),
            "response too large (250 bytes, cap 100)"
        );
    }
}
