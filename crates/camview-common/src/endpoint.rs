//! Stream endpoint resolution.
//!
//! [`resolve`] turns a user-supplied URL string into a [`StreamEndpoint`]:
//! a validated `{host, port, scheme}` triple plus the original URL, which the
//! transcoder needs as its input argument. No network I/O happens here.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{Error, Result};

/// Default port for `rtsp://` and for any scheme we don't recognise.
pub const DEFAULT_RTSP_PORT: u16 = 554;

/// URL scheme of a stream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    Rtsp,
    /// Any other scheme, lower-cased, without the trailing colon.
    Other(String),
}

impl Scheme {
    /// Parse a protocol token such as `"RTSP:"` or `"http"`.
    pub fn from_protocol(protocol: &str) -> Self {
        let token = protocol.trim_end_matches(':').to_ascii_lowercase();
        match token.as_str() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "rtsp" => Scheme::Rtsp,
            _ => Scheme::Other(token),
        }
    }

    /// Port used when the URL does not name one explicitly.
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
            Scheme::Rtsp | Scheme::Other(_) => DEFAULT_RTSP_PORT,
        }
    }

    /// True for schemes carried over RTSP signalling (`rtsp`, `rtsps`).
    pub fn is_rtsp_family(&self) -> bool {
        match self {
            Scheme::Rtsp => true,
            Scheme::Other(s) => s == "rtsps",
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Rtsp => "rtsp",
            Scheme::Other(s) => s,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated network camera stream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamEndpoint {
    /// Hostname or IP literal (IPv6 without brackets).
    pub host: String,
    /// Always in `1..=65535`.
    pub port: u16,
    pub scheme: Scheme,
    /// The URL exactly as supplied by the caller.
    pub url: String,
}

impl StreamEndpoint {
    /// `host:port` form suitable for logging and socket connects.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for StreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority())
    }
}

/// Resolve a raw URL string into a [`StreamEndpoint`].
///
/// # Errors
///
/// Returns [`Error::Validation`] if `raw` is not an absolute URL or has no
/// hostname.
pub fn resolve(raw: &str) -> Result<StreamEndpoint> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|e| Error::validation(format!("invalid URL: {e}")))?;

    let host = match url.host() {
        Some(Host::Domain(d)) if !d.is_empty() => d.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(Error::validation("URL has no hostname")),
    };

    let scheme = Scheme::from_protocol(url.scheme());

    // `Url::port` elides the scheme default for special schemes, which
    // infers to the same value anyway.
    let port = match url.port() {
        Some(p) if p > 0 => p,
        _ => scheme.default_port(),
    };

    Ok(StreamEndpoint {
        host,
        port,
        scheme,
        url: raw.to_string(),
    })
}
