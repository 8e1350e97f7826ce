//! The [`Prober`] trait that all reachability backends implement.

use async_trait::async_trait;
use camview_common::StreamEndpoint;

use crate::types::ProbeResult;

/// A backend capable of checking whether a stream endpoint is reachable.
///
/// Implementations never fail: refusals, resolution errors, and timeouts are
/// all encoded in the returned [`ProbeResult`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe the endpoint once.
    async fn probe(&self, endpoint: &StreamEndpoint) -> ProbeResult;
}
