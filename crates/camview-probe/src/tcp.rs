//! Raw TCP connect probe.

use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use camview_common::StreamEndpoint;
use tokio::net::TcpStream;

use crate::prober::Prober;
use crate::types::ProbeResult;

/// Default probe timeout: 5 seconds.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Fallback when the OS error carries no description.
const GENERIC_ERROR_MESSAGE: &str = "Error while connecting to stream endpoint.";

/// [`Prober`] that opens a plain TCP connection to `host:port`.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl Prober for TcpProber {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn probe(&self, endpoint: &StreamEndpoint) -> ProbeResult {
        probe(endpoint, self.timeout).await
    }
}

/// Probe `endpoint` for TCP reachability, giving up after `timeout`.
pub async fn probe(endpoint: &StreamEndpoint, timeout: Duration) -> ProbeResult {
    tracing::debug!(endpoint = %endpoint, ?timeout, "Probing stream endpoint");

    let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
    let result = race(connect, timeout).await;

    if result.ok {
        tracing::debug!(
            endpoint = %endpoint,
            round_trip_ms = result.round_trip_ms,
            "Stream endpoint reachable"
        );
    } else {
        tracing::debug!(endpoint = %endpoint, message = %result.message, "Stream endpoint unreachable");
    }

    result
}

/// Race a connect attempt against a timer.
///
/// Whichever completes first decides the result; the losing future is
/// dropped, which closes any half-open socket. A connected stream is closed
/// before returning.
async fn race<S, F>(connect: F, timeout: Duration) -> ProbeResult
where
    F: Future<Output = io::Result<S>>,
{
    let started = Instant::now();

    tokio::select! {
        outcome = connect => match outcome {
            Ok(stream) => {
                let elapsed = started.elapsed();
                drop(stream);
                ProbeResult::reachable(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            }
            Err(e) => ProbeResult::failed(describe(&e)),
        },
        _ = tokio::time::sleep(timeout) => ProbeResult::timed_out(),
    }
}

fn describe(e: &io::Error) -> String {
    let message = e.to_string();
    if message.trim().is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}
