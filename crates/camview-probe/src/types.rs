//! Probe result type.

use serde::{Deserialize, Serialize};

/// Message reported when the TCP handshake completes.
pub const REACHABLE_MESSAGE: &str = "TCP port is reachable for the stream endpoint.";

/// Message reported when the timer fires before connect or error.
pub const TIMEOUT_MESSAGE: &str = "Timed out while connecting to stream endpoint.";

/// Outcome of a single reachability probe.
///
/// Serializes as `{"ok", "message", "roundTripMs"}`; `roundTripMs` is omitted
/// when the probe did not connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip_ms: Option<u64>,
}

impl ProbeResult {
    pub fn reachable(round_trip_ms: u64) -> Self {
        Self {
            ok: true,
            message: REACHABLE_MESSAGE.to_string(),
            round_trip_ms: Some(round_trip_ms),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            round_trip_ms: None,
        }
    }

    pub fn timed_out() -> Self {
        Self::failed(TIMEOUT_MESSAGE)
    }

    /// True when this result came from the timeout branch.
    pub fn is_timeout(&self) -> bool {
        !self.ok && self.message == TIMEOUT_MESSAGE
    }
}
