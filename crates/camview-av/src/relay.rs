//! Transcoder output relay.
//!
//! A [`RelayStream`] turns the transcoder's stdout into a
//! `Stream<Item = io::Result<Bytes>>` suitable for an HTTP response body.
//! Chunks are forwarded in arrival order; the stream only reads when the
//! consumer polls, so a slow client backs up into the pipe and stalls the
//! transcoder rather than growing a buffer.
//!
//! The relay is a small state machine:
//!
//! ```text
//! Idle -> Streaming -> Completed   (stdout EOF)
//!                   -> Errored     (read error or process fault)
//!                   -> Cancelled   (dropped by the consumer)
//! ```
//!
//! Exactly one terminal transition fires, and each one ends the transcoder
//! through its [`ProcessHandle`]. Errored and Cancelled kill it at once;
//! Completed gives it a grace period to exit on its own so its exit status is
//! still reported.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use camview_common::SessionId;
use futures::Stream;
use tokio::io::AsyncRead;
use tokio::process::ChildStdout;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;

use crate::supervisor::{ProcessHandle, TranscodeSession};

/// Read size for transcoder output.
const CHUNK_SIZE: usize = 64 * 1024;

/// Lifecycle of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming,
    Completed,
    Errored,
    Cancelled,
}

impl RelayState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RelayState::Completed | RelayState::Errored | RelayState::Cancelled
        )
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition(self, next: RelayState) -> bool {
        matches!(
            (self, next),
            (RelayState::Idle, RelayState::Streaming)
                | (
                    RelayState::Streaming,
                    RelayState::Completed | RelayState::Errored | RelayState::Cancelled
                )
        )
    }
}

/// Relay a transcode session's stdout as a byte stream.
///
/// The session's termination responsibility moves to the returned stream.
pub fn relay(session: TranscodeSession) -> RelayStream {
    let TranscodeSession {
        id,
        endpoint: _,
        stdout,
        fault,
        guard,
    } = session;

    RelayStream::new(id, stdout, Some(fault), guard.disarm())
}

/// Live transcoder output. See the module docs for the state machine.
#[derive(Debug)]
pub struct RelayStream<R = ChildStdout> {
    session_id: SessionId,
    state: RelayState,
    chunks: ReaderStream<R>,
    fault: Option<oneshot::Receiver<io::Error>>,
    handle: ProcessHandle,
    bytes_sent: u64,
}

impl<R: AsyncRead> RelayStream<R> {
    pub(crate) fn new(
        session_id: SessionId,
        reader: R,
        fault: Option<oneshot::Receiver<io::Error>>,
        handle: ProcessHandle,
    ) -> Self {
        let mut relay = Self {
            session_id,
            state: RelayState::Idle,
            chunks: ReaderStream::with_capacity(reader, CHUNK_SIZE),
            fault,
            handle,
            bytes_sent: 0,
        };
        relay.transition(RelayState::Streaming);
        relay
    }
}

impl<R> RelayStream<R> {
    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn transition(&mut self, next: RelayState) -> bool {
        if !self.state.can_transition(next) {
            tracing::trace!(
                session = %self.session_id,
                "Ignoring relay transition {:?} -> {:?}",
                self.state,
                next
            );
            return false;
        }
        self.state = next;
        true
    }

    fn fail(&mut self, error: &io::Error) {
        if self.transition(RelayState::Errored) {
            tracing::error!(
                session = %self.session_id,
                bytes_sent = self.bytes_sent,
                "Transcoder stream failed: {error}"
            );
            self.handle.terminate();
        }
    }

    fn complete(&mut self) {
        if self.transition(RelayState::Completed) {
            tracing::info!(
                session = %self.session_id,
                bytes_sent = self.bytes_sent,
                "Transcoder stream finished"
            );
            self.handle.finish();
        }
    }
}

impl<R: AsyncRead + Unpin> Stream for RelayStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        if let Some(fault) = this.fault.as_mut() {
            match Pin::new(fault).poll(cx) {
                Poll::Ready(Ok(error)) => {
                    this.fault = None;
                    this.fail(&error);
                    return Poll::Ready(Some(Err(error)));
                }
                // Supervisor finished without a fault.
                Poll::Ready(Err(_)) => this.fault = None,
                Poll::Pending => {}
            }
        }

        match Pin::new(&mut this.chunks).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if this.bytes_sent == 0 {
                    this.handle.mark_streaming();
                }
                this.bytes_sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(error))) => {
                this.fail(&error);
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                this.complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<R> Drop for RelayStream<R> {
    fn drop(&mut self) {
        if self.transition(RelayState::Cancelled) {
            tracing::info!(
                session = %self.session_id,
                bytes_sent = self.bytes_sent,
                "Client disconnected, killing transcoder"
            );
            self.handle.terminate();
        }
    }
}
