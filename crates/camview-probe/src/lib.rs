//! # camview-probe
//!
//! TCP-level reachability probing for stream endpoints.
//!
//! A probe answers "is anything listening on this host:port?" without
//! speaking the stream protocol itself. It is cheap enough to run before
//! committing to a transcode session.
//!
//! ## Quick start
//!
//! ```no_run
//! use camview_probe::{Prober, TcpProber};
//! use std::time::Duration;
//!
//! # async fn example() -> camview_common::Result<()> {
//! let endpoint = camview_common::resolve("rtsp://10.0.0.5/stream")?;
//! let prober = TcpProber::new(Duration::from_millis(5000));
//! let result = prober.probe(&endpoint).await;
//! println!("{} ({:?} ms)", result.message, result.round_trip_ms);
//! # Ok(())
//! # }
//! ```

pub mod prober;
pub mod tcp;
pub mod types;

pub use prober::Prober;
pub use tcp::{probe, TcpProber, DEFAULT_PROBE_TIMEOUT};
pub use types::ProbeResult;
