//! Streaming relay: proxies the gateway's event-stream response to the
//! downstream consumer line by line.
//!
//! Each session walks a one-way state machine from `Initiated` through
//! `Forwarding` to `Completed` or `CompletedWithError`. Whatever goes
//! wrong (error status before the body, an I/O fault mid-stream, the
//! session ceiling expiring), the consumer sees at most one synthetic
//! `data: {"error": ...}` event and the session lands in a terminal state.
//! No fault escapes the relay as an error return.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use llmrelay_core::GatewaySettings;

use crate::upstream::{CLIENT_ID_HEADER, CLIENT_SECRET_HEADER};

/// Frames buffered between the relay worker and the downstream body.
/// Each frame is sent the moment its line arrives; the capacity only
/// smooths bursts, it never coalesces lines.
const FRAME_CHANNEL_CAPACITY: usize = 32;

/// How a finished session terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream body exhausted cleanly.
    Completed,
    /// The session ended via the synthetic error event.
    CompletedWithError(String),
}

/// Final accounting for one relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Terminal outcome, delivered exactly once.
    pub outcome: RelayOutcome,
    /// Status returned by the gateway, if headers were received.
    pub upstream_status: Option<u16>,
    /// Non-empty lines forwarded downstream.
    pub lines_forwarded: u64,
}

/// Handle on a running relay worker.
pub struct RelayHandle {
    join: JoinHandle<RelayReport>,
}

impl RelayHandle {
    /// Wait for the worker and collect its final report.
    pub async fn report(self) -> RelayReport {
        self.join.await.unwrap_or_else(|e| RelayReport {
            outcome: RelayOutcome::CompletedWithError(format!("relay worker failed: {e}")),
            upstream_status: None,
            lines_forwarded: 0,
        })
    }
}

/// Relay for streaming chat completions.
///
/// Holds the shared pooled client and a bounded worker pool. Each session
/// takes one pool slot for its lifetime and owns its upstream connection;
/// nothing is shared between sessions.
pub struct StreamingRelay {
    client: Client,
    settings: GatewaySettings,
    sessions: Arc<Semaphore>,
    session_timeout: Duration,
}

impl StreamingRelay {
    /// Create a relay with `max_sessions` concurrent session slots.
    #[must_use]
    pub fn new(
        client: Client,
        settings: GatewaySettings,
        max_sessions: usize,
        session_timeout: Duration,
    ) -> Self {
        Self {
            client,
            settings,
            sessions: Arc::new(Semaphore::new(max_sessions)),
            session_timeout,
        }
    }

    /// Currently free session slots.
    #[must_use]
    pub fn available_sessions(&self) -> usize {
        self.sessions.available_permits()
    }

    /// Start a streaming session for `body`.
    ///
    /// Returns the downstream frame stream and a handle on the worker.
    /// Admission waits for a free session slot; once admitted, the worker
    /// runs independently of the caller and always produces a terminal
    /// outcome, even if the returned stream is dropped early.
    pub async fn open(&self, body: JsonValue) -> (ReceiverStream<Bytes>, RelayHandle) {
        let permit = self
            .sessions
            .clone()
            .acquire_owned()
            .await
            .expect("session semaphore is never closed");

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let worker = SessionWorker {
            client: self.client.clone(),
            settings: self.settings.clone(),
            session_timeout: self.session_timeout,
        };
        let join = tokio::spawn(worker.run(body, tx, permit));

        (ReceiverStream::new(rx), RelayHandle { join })
    }
}

/// Session lifecycle states. Transitions are strictly forward; a terminal
/// state is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
    Initiated,
    Forwarding,
    Completed,
    CompletedWithError,
}

/// Per-session transient state.
struct RelaySession {
    state: RelayState,
    upstream_status: Option<u16>,
    lines_forwarded: u64,
}

impl RelaySession {
    const fn new() -> Self {
        Self {
            state: RelayState::Initiated,
            upstream_status: None,
            lines_forwarded: 0,
        }
    }

    const fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            RelayState::Completed | RelayState::CompletedWithError
        )
    }

    fn begin_forwarding(&mut self) {
        if self.state == RelayState::Initiated {
            self.state = RelayState::Forwarding;
        }
    }

    fn complete(&mut self) {
        if !self.is_terminal() {
            self.state = RelayState::Completed;
        }
    }

    fn complete_with_error(&mut self) {
        if !self.is_terminal() {
            self.state = RelayState::CompletedWithError;
        }
    }
}

struct SessionWorker {
    client: Client,
    settings: GatewaySettings,
    session_timeout: Duration,
}

impl SessionWorker {
    async fn run(
        self,
        body: JsonValue,
        tx: mpsc::Sender<Bytes>,
        permit: OwnedSemaphorePermit,
    ) -> RelayReport {
        // Slot held for the whole session; dropping the permit on any exit
        // path returns it to the pool.
        let _permit = permit;

        let mut session = RelaySession::new();
        let ceiling = self.session_timeout;

        let outcome =
            match tokio::time::timeout(ceiling, self.relay_loop(body, &tx, &mut session)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let message =
                        format!("streaming session exceeded {}s ceiling", ceiling.as_secs());
                    warn!(%message, "Terminating relay session");
                    fail(&tx, &mut session, message).await
                }
            };

        debug!(
            ?outcome,
            upstream_status = ?session.upstream_status,
            lines = session.lines_forwarded,
            "Relay session finished"
        );

        RelayReport {
            outcome,
            upstream_status: session.upstream_status,
            lines_forwarded: session.lines_forwarded,
        }
    }

    async fn relay_loop(
        &self,
        body: JsonValue,
        tx: &mpsc::Sender<Bytes>,
        session: &mut RelaySession,
    ) -> RelayOutcome {
        info!(url = %self.settings.chat_url, "Opening streaming session to gateway");

        let response = match self
            .client
            .post(&self.settings.chat_url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .header(CLIENT_ID_HEADER, &self.settings.client_id)
            .header(CLIENT_SECRET_HEADER, &self.settings.client_secret)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to reach gateway for streaming request: {e}");
                return fail(tx, session, e.to_string()).await;
            }
        };

        let status = response.status();
        session.upstream_status = Some(status.as_u16());

        if !status.is_success() {
            // Capture the error body, emit it as the single terminal
            // event, and stop without reading further. If even the error
            // body cannot be read, the read failure becomes the message.
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read gateway error body: {e}"));
            error!(status = status.as_u16(), body = %error_body, "Gateway streaming error");
            return fail(tx, session, error_body).await;
        }

        session.begin_forwarding();

        let mut stream = response.bytes_stream();
        let mut buf = BytesMut::new();

        loop {
            while let Some(line_end) = find_newline(&buf) {
                let raw = buf.split_to(line_end);
                let line_str = String::from_utf8_lossy(&raw);
                let line = line_str.trim_end_matches(['\n', '\r']);

                // Blank keep-alive separators are dropped, not forwarded.
                if line.is_empty() {
                    continue;
                }
                if forward_line(tx, session, line).await.is_err() {
                    return abandon(session);
                }
            }

            match stream.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!("Gateway stream fault mid-body: {e}");
                    return fail(tx, session, e.to_string()).await;
                }
                None => break,
            }
        }

        // Upstream may end without a trailing newline on the last record.
        if !buf.is_empty() {
            let line_str = String::from_utf8_lossy(&buf);
            let line = line_str.trim_end_matches('\r');
            if !line.is_empty() && forward_line(tx, session, line).await.is_err() {
                return abandon(session);
            }
        }

        session.complete();
        RelayOutcome::Completed
    }
}

/// Forward one non-empty line downstream, newline restored.
async fn forward_line(
    tx: &mpsc::Sender<Bytes>,
    session: &mut RelaySession,
    line: &str,
) -> Result<(), mpsc::error::SendError<Bytes>> {
    tx.send(Bytes::from(format!("{line}\n"))).await?;
    session.lines_forwarded += 1;
    Ok(())
}

/// Emit the single synthetic error event and move to the error terminal.
async fn fail(
    tx: &mpsc::Sender<Bytes>,
    session: &mut RelaySession,
    message: String,
) -> RelayOutcome {
    // Best effort: if the consumer already went away there is nobody left
    // to tell.
    let _ = tx.send(error_event(&message)).await;
    session.complete_with_error();
    RelayOutcome::CompletedWithError(message)
}

/// Terminal for a downstream disconnect: the consumer is gone, so no event
/// is emitted; the upstream connection is released by dropping the stream.
fn abandon(session: &mut RelaySession) -> RelayOutcome {
    let message = "downstream consumer disconnected".to_string();
    debug!("Downstream consumer disconnected, abandoning upstream read");
    session.complete_with_error();
    RelayOutcome::CompletedWithError(message)
}

/// Wire form of the synthetic terminal error event.
fn error_event(message: &str) -> Bytes {
    let payload = serde_json::json!({ "error": message });
    Bytes::from(format!("data: {payload}\n\n"))
}

/// Position just past the next newline, if the buffer holds a full line.
fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}
