//! WebSocket connection lifecycle.
//!
//! Clients connect to `GET /ws`. After the upgrade the connection is
//! registered and two halves run side by side:
//!
//! - a writer task draining the connection's outbound queue into the
//!   socket sink, and
//! - the receive loop, which hands every data frame to
//!   [`dispatch::handle_message`] and waits for it (broadcast included)
//!   before reading the next frame.
//!
//! The connection closes on the first read error, the first write error,
//! a close frame, or removal from the registry by a failed broadcast.
//! Whichever comes first, the connection is deregistered and never
//! comes back; a reconnecting client is a new connection. A pruned
//! connection drops its socket at once. After a peer close, the writer
//! gets [`CLOSE_GRACE`] to flush before it is cancelled.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt as _, StreamExt as _};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatch;
use crate::registry::{Connection, Payload};
use crate::state::AppState;

/// How long the writer may keep flushing queued frames and the close
/// frame after the peer has gone away.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Why the receive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The peer sent a close frame, hung up, or a read failed.
    Peer,
    /// A socket write failed and the writer task ended.
    WriteFailed,
    /// The registry dropped the connection after a failed broadcast write.
    Pruned,
}

/// How the writer task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterStop {
    /// It finished on its own within the grace period.
    Finished,
    /// It was still blocked on the socket and was cancelled.
    Aborted,
}

/// Upgrade an HTTP request to a WebSocket sync connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_sync(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Run one connection from registration to deregistration.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let (connection, outbox) = Connection::new(state.outbound_buffer);
    let id = connection.id();
    let (queue, mut released) = outbox.into_parts();
    state.registry.register(connection).await;
    debug!(connection_id = %id, "WebSocket client connected");

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, queue));

    let exit = loop {
        tokio::select! {
            biased;
            _ = &mut released => break Exit::Pruned,
            _ = &mut writer => break Exit::WriteFailed,
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    dispatch::handle_message(&state, id, text.as_bytes()).await;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    dispatch::handle_message(&state, id, &bytes).await;
                }
                Some(Ok(Message::Close(_))) | None => break Exit::Peer,
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Pongs are queued by the transport itself.
                }
                Some(Err(e)) => {
                    debug!(connection_id = %id, error = %e, "WebSocket read error");
                    break Exit::Peer;
                }
            },
        }
    };

    state.registry.deregister(id).await;

    let stopped = match exit {
        // Deregistering closed the queue; let the writer flush and send
        // the close frame.
        Exit::Peer => Some(stop_writer(writer, CLOSE_GRACE).await),
        // The peer is not keeping up. Drop the socket without waiting.
        Exit::Pruned => Some(stop_writer(writer, Duration::ZERO).await),
        Exit::WriteFailed => None,
    };

    drop(stream);
    debug!(connection_id = %id, ?exit, ?stopped, "WebSocket connection closed");
}

/// Give the writer `grace` to finish, then cancel it.
///
/// Returns once the task has ended and released its half of the socket.
async fn stop_writer(mut writer: JoinHandle<()>, grace: Duration) -> WriterStop {
    if tokio::time::timeout(grace, &mut writer).await.is_ok() {
        return WriterStop::Finished;
    }
    writer.abort();
    let cancelled = writer.await.is_err();
    debug!(cancelled, "WebSocket writer aborted");
    WriterStop::Aborted
}

/// Forward queued payloads to the socket until the queue closes or a
/// write fails, then send a close frame.
async fn write_loop<S>(mut sink: S, mut queue: mpsc::Receiver<Payload>)
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(payload) = queue.recv().await {
        if let Err(e) = sink.send(Message::Text(payload.as_ref().into())).await {
            debug!(error = %e, "WebSocket write failed");
            return;
        }
    }
    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!(error = %e, "WebSocket close frame not sent");
    }
}
