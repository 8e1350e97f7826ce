//! # camview-av
//!
//! External transcoder management for live camera viewing.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg, either from configuration or `PATH`.
//! - **Command building** ([`ToolCommand`]) -- spawn an external tool with
//!   piped output and kill-on-drop semantics.
//! - **Transcode profile** ([`profile`]) -- the fixed low-latency fragmented
//!   MP4 argument list.
//! - **Process supervision** ([`TranscodeSupervisor`]) -- one owned
//!   subprocess per session, terminated exactly once on every exit path.
//! - **Output relay** ([`RelayStream`]) -- the subprocess stdout as a
//!   `Stream` of byte chunks that kills the transcoder when dropped early.

pub mod command;
pub mod profile;
pub mod relay;
pub mod supervisor;
pub mod tools;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

// ---- Re-exports for convenience ----

pub use command::ToolCommand;
pub use profile::transcode_args;
pub use relay::{relay, RelayState, RelayStream};
pub use supervisor::{ProcessHandle, SessionState, TranscodeSession, TranscodeSupervisor};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, TRANSCODER};
