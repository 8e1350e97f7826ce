//! Transcoder process supervision.
//!
//! [`TranscodeSupervisor::start`] spawns one transcoder per request and hands
//! the `Child` to a dedicated task, which is the only owner of the process.
//! Everything else talks to the process through a [`ProcessHandle`]: a
//! capability that can request termination and observe the session state,
//! but cannot touch the process directly.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use camview_common::{Error, Result, SessionId, StreamEndpoint};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::profile::transcode_args;
use crate::relay::{relay, RelayStream};
use crate::tools::{ToolRegistry, TRANSCODER};

/// How long a transcoder may keep running after closing stdout.
pub const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of a transcode session's process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Spawned, no output delivered yet.
    Starting,
    /// At least one output chunk has been delivered.
    Streaming,
    /// The process has exited or been killed, and has been reaped.
    Terminated,
}

/// Capability to terminate and observe a supervised process.
///
/// Cheap to clone. [`ProcessHandle::terminate`] is idempotent.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    session_id: SessionId,
    kill: CancellationToken,
    finish: CancellationToken,
    state: Arc<watch::Sender<SessionState>>,
}

impl ProcessHandle {
    pub(crate) fn new(session_id: SessionId) -> Self {
        let (state, _) = watch::channel(SessionState::Starting);
        Self {
            session_id,
            kill: CancellationToken::new(),
            finish: CancellationToken::new(),
            state: Arc::new(state),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Request a non-graceful kill of the process.
    ///
    /// Returns immediately; the supervising task delivers SIGKILL and reaps
    /// the process. Calling this on a terminated session is a no-op.
    pub fn terminate(&self) {
        self.kill.cancel();
    }

    pub fn is_terminate_requested(&self) -> bool {
        self.kill.is_cancelled()
    }

    /// Signal that all output has been delivered.
    ///
    /// The process is given [`EXIT_GRACE`] to exit by itself, so its exit
    /// status is still reported, and is killed after that.
    pub fn finish(&self) {
        self.finish.cancel();
    }

    pub fn is_finish_requested(&self) -> bool {
        self.finish.is_cancelled()
    }

    /// Wait until the process has been reaped.
    pub async fn terminated(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| *s == SessionState::Terminated).await;
    }

    pub(crate) fn mark_streaming(&self) {
        self.state.send_if_modified(|s| {
            if *s == SessionState::Starting {
                *s = SessionState::Streaming;
                true
            } else {
                false
            }
        });
    }

    fn mark_terminated(&self) {
        self.state.send_replace(SessionState::Terminated);
    }
}

/// Terminates the process when dropped, unless disarmed.
#[derive(Debug)]
pub(crate) struct TerminateOnDrop {
    handle: ProcessHandle,
    armed: bool,
}

impl TerminateOnDrop {
    fn new(handle: ProcessHandle) -> Self {
        Self {
            handle,
            armed: true,
        }
    }

    /// Hand responsibility for termination to the caller.
    pub(crate) fn disarm(mut self) -> ProcessHandle {
        self.armed = false;
        self.handle.clone()
    }
}

impl Drop for TerminateOnDrop {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(
                session = %self.handle.session_id,
                "Transcode session dropped before relaying; terminating transcoder"
            );
            self.handle.terminate();
        }
    }
}

/// One in-flight transcoder process, owned by the request that started it.
///
/// Turn it into a byte stream with [`TranscodeSession::into_relay`]. Dropping
/// the session without relaying terminates the process.
#[derive(Debug)]
pub struct TranscodeSession {
    pub(crate) id: SessionId,
    pub(crate) endpoint: StreamEndpoint,
    pub(crate) stdout: ChildStdout,
    pub(crate) fault: oneshot::Receiver<io::Error>,
    pub(crate) guard: TerminateOnDrop,
}

impl TranscodeSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn endpoint(&self) -> &StreamEndpoint {
        &self.endpoint
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.guard.handle
    }

    pub fn state(&self) -> SessionState {
        self.guard.handle.state()
    }

    /// Start relaying the transcoder's stdout.
    pub fn into_relay(self) -> RelayStream {
        relay(self)
    }
}

/// Spawns and supervises transcoder processes.
#[derive(Debug, Clone)]
pub struct TranscodeSupervisor {
    tools: Arc<ToolRegistry>,
}

impl TranscodeSupervisor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Spawn a transcoder for `endpoint`.
    ///
    /// Must be called from within a Tokio runtime: the process is supervised
    /// by a spawned task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if the transcoder is not installed or fails to
    /// start. No process is left running in that case.
    pub fn start(&self, endpoint: &StreamEndpoint) -> Result<TranscodeSession> {
        let tool = self.tools.require(TRANSCODER)?;

        let mut cmd = ToolCommand::new(tool.path.clone());
        cmd.args(transcode_args(endpoint));
        let mut child = cmd.spawn_piped()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("transcoder stdout was not piped".into()))?;
        let stderr = child.stderr.take();

        let id = SessionId::new();
        let handle = ProcessHandle::new(id);
        let (fault_tx, fault_rx) = oneshot::channel();

        tracing::info!(
            session = %id,
            endpoint = %endpoint,
            pid = child.id(),
            "Transcoder started"
        );

        if let Some(stderr) = stderr {
            tokio::spawn(forward_diagnostics(id, cmd.program_name(), stderr));
        }
        tokio::spawn(supervise(child, handle.clone(), fault_tx));

        Ok(TranscodeSession {
            id,
            endpoint: endpoint.clone(),
            stdout,
            fault: fault_rx,
            guard: TerminateOnDrop::new(handle),
        })
    }

    /// Kill the session's process. Idempotent.
    pub fn terminate(&self, handle: &ProcessHandle) {
        handle.terminate();
    }
}

enum Wake {
    Exited(io::Result<ExitStatus>),
    Kill,
    Finished,
}

/// Own the child until it exits or a kill is requested, then reap it.
async fn supervise(mut child: Child, handle: ProcessHandle, fault: oneshot::Sender<io::Error>) {
    let id = handle.session_id;

    let wake = tokio::select! {
        biased;
        status = child.wait() => Wake::Exited(status),
        _ = handle.kill.cancelled() => Wake::Kill,
        _ = handle.finish.cancelled() => Wake::Finished,
    };

    let kill_requested = match wake {
        Wake::Exited(status) => {
            report_exit(id, status, fault);
            false
        }
        Wake::Kill => true,
        Wake::Finished => {
            let status = tokio::select! {
                biased;
                status = child.wait() => Some(status),
                _ = handle.kill.cancelled() => None,
                _ = tokio::time::sleep(EXIT_GRACE) => {
                    tracing::warn!(session = %id, "Transcoder still running after closing stdout");
                    None
                }
            };
            match status {
                Some(status) => {
                    report_exit(id, status, fault);
                    false
                }
                None => true,
            }
        }
    };

    if kill_requested {
        if let Err(e) = child.start_kill() {
            tracing::debug!(session = %id, "Transcoder already gone: {e}");
        }
        match child.wait().await {
            Ok(status) => tracing::debug!(session = %id, %status, "Transcoder killed"),
            Err(e) => tracing::warn!(session = %id, "Failed to reap killed transcoder: {e}"),
        }
    }

    handle.mark_terminated();
}

fn report_exit(id: SessionId, status: io::Result<ExitStatus>, fault: oneshot::Sender<io::Error>) {
    match status {
        Ok(status) => match status.code() {
            Some(0) => tracing::info!(session = %id, "Transcoder exited"),
            // Advisory: bytes already delivered stay delivered.
            Some(code) => tracing::warn!(session = %id, code, "Transcoder exited with code {code}"),
            None => tracing::debug!(session = %id, %status, "Transcoder terminated by signal"),
        },
        Err(e) => {
            tracing::error!(session = %id, "Failed to wait on transcoder: {e}");
            let _ = fault.send(e);
        }
    }
}

/// Forward each stderr line to the log. Never fails the session.
async fn forward_diagnostics(id: SessionId, tool: String, stderr: ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end();
                if !text.is_empty() {
                    tracing::debug!(session = %id, "[{tool}] {text}");
                }
            }
            Err(e) => {
                tracing::debug!(session = %id, "Stopped reading {tool} stderr: {e}");
                break;
            }
        }
    }
}
