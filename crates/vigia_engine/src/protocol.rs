//! Control-socket protocol.
//!
//! Requests and responses travel as single-line JSON. Action names and
//! response shapes are kept byte-compatible with the monitor clients that
//! predate the daemon, `tabId` and all.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{PageId, QueueSnapshot, QueueState};

/// Fallback refresh period when a set-interval request omits the field.
pub const DEFAULT_REFRESH_SECONDS: f64 = 180.0;

/// One client request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum Request {
    /// Last known queue state, served from memory.
    #[serde(rename = "getFilaState")]
    GetFilaState,
    /// Identity of the page currently monitored, if any.
    #[serde(rename = "getMonitoredTabId")]
    GetMonitoredTabId,
    /// Enable or disable monitoring.
    #[serde(rename = "toggleExtension")]
    ToggleExtension { enabled: bool },
    /// Change the poll period.
    #[serde(rename = "setRefreshSeconds")]
    SetRefreshSeconds {
        #[serde(default, deserialize_with = "present_value")]
        seconds: Option<Value>,
    },
    /// Live queue state, probed on demand without touching the monitor.
    #[serde(rename = "getDocumentState")]
    GetDocumentState,
}

/// Keeps an explicit `null` distinguishable from a missing field: absent
/// falls back to the default period, `null` is invalid input.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One server response. Untagged: each variant serialises to the flat
/// object the corresponding action expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Queue {
        state: QueueState,
        count: u32,
    },
    MonitoredTab {
        #[serde(rename = "tabId")]
        tab_id: Option<PageId>,
    },
    Ack {
        success: bool,
    },
    IntervalSet {
        success: bool,
        seconds: Value,
    },
    Failure {
        success: bool,
        message: String,
    },
}

impl Response {
    pub fn queue(snapshot: QueueSnapshot) -> Self {
        Response::Queue {
            state: snapshot.state,
            count: snapshot.count,
        }
    }

    pub fn monitored_tab(tab_id: Option<PageId>) -> Self {
        Response::MonitoredTab { tab_id }
    }

    pub fn ok() -> Self {
        Response::Ack { success: true }
    }

    pub fn interval_set(seconds: f64) -> Self {
        Response::IntervalSet {
            success: true,
            seconds: seconds_value(seconds),
        }
    }

    pub fn invalid_seconds() -> Self {
        Response::Failure {
            success: false,
            message: "invalid_seconds".to_string(),
        }
    }

    pub fn invalid_request() -> Self {
        Response::Failure {
            success: false,
            message: "invalid_request".to_string(),
        }
    }
}

/// Coerce the `seconds` field the way a loosely typed client would:
/// numbers pass through, numeric strings parse, a missing field falls back
/// to the default, anything else (explicit `null` included) is invalid.
pub fn coerce_seconds(value: Option<&Value>) -> Option<f64> {
    match value {
        None => Some(DEFAULT_REFRESH_SECONDS),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
}

/// Render whole-second values as JSON integers so `{"seconds":180}` stays
/// `{"seconds":180}` on the wire.
fn seconds_value(seconds: f64) -> Value {
    if seconds.fract() == 0.0 && seconds >= 0.0 && seconds <= u64::MAX as f64 {
        Value::from(seconds as u64)
    } else {
        Value::from(seconds)
    }
}
