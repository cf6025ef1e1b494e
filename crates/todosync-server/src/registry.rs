//! The set of live client connections.
//!
//! A [`Connection`] is the sending half of a bounded per-client outbound
//! queue. The receiving half ([`Outbox`]) is drained by the writer task
//! that owns the socket sink (see [`crate::ws`]). Removing a connection
//! from the [`Registry`] drops it, which closes the queue and fires the
//! outbox's [`Released`] signal so the socket task can tear the
//! transport down even when the writer is stuck on a slow peer.
//!
//! All access goes through one [`Mutex`]. Fan-out holds the lock for the
//! whole pass, so two broadcasts never interleave and every connection
//! sees payloads in the order they were issued. Queue pushes never block:
//! a closed or full queue is reported as a failed write and the
//! connection is pruned in the same pass.

use std::collections::HashMap;
use std::sync::Arc;

use todosync_types::ConnectionId;
use tokio::sync::{Mutex, mpsc, oneshot};

/// A serialized outbound frame, shared by every recipient of a broadcast.
pub type Payload = Arc<str>;

/// Resolves (with an error) once the registry has dropped the
/// connection.
pub type Released = oneshot::Receiver<()>;

/// Receiving half of a connection's outbound queue.
#[derive(Debug)]
pub struct Outbox {
    rx: mpsc::Receiver<Payload>,
    released: Released,
}

impl Outbox {
    /// Wait for the next queued payload. `None` once the connection has
    /// been dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.rx.recv().await
    }

    /// Take a queued payload without waiting.
    pub fn try_recv(&mut self) -> Result<Payload, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Split into the payload queue (for the writer task) and the
    /// release signal (for the socket task).
    pub fn into_parts(self) -> (mpsc::Receiver<Payload>, Released) {
        (self.rx, self.released)
    }
}

/// Handle to one live client, owned by the [`Registry`] once registered.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<Payload>,
    // Never sent on; dropping it is the signal.
    _release: oneshot::Sender<()>,
}

impl Connection {
    /// Create a connection with a fresh id and an outbound queue holding
    /// at most `capacity` undelivered payloads.
    pub fn new(capacity: usize) -> (Self, Outbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (release, released) = oneshot::channel();
        (
            Self {
                id: ConnectionId::new(),
                tx,
                _release: release,
            },
            Outbox { rx, released },
        )
    }

    /// This connection's id.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a payload without waiting.
    ///
    /// Fails when the writer task has exited or the client has fallen
    /// `capacity` payloads behind.
    pub fn try_send(&self, payload: Payload) -> Result<(), WriteError> {
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => WriteError::Backlogged,
            mpsc::error::TrySendError::Closed(_) => WriteError::Closed,
        })
    }
}

/// Why a payload could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// The writer task is gone (socket write failed or socket closed).
    #[error("connection closed")]
    Closed,
    /// The client stopped reading and its queue is full.
    #[error("outbound queue full")]
    Backlogged,
}

/// Result of one fan-out pass over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Connections that accepted the payload.
    pub delivered: usize,
    /// Connections that failed and were removed.
    pub pruned: Vec<ConnectionId>,
}

/// Concurrency-safe set of live connections.
#[derive(Debug, Default)]
pub struct Registry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the live set.
    pub async fn register(&self, connection: Connection) {
        let id = connection.id();
        let mut connections = self.connections.lock().await;
        connections.insert(id, connection);
        tracing::debug!(connection_id = %id, live = connections.len(), "Connection registered");
    }

    /// Remove a connection. Removing an absent connection is a no-op.
    ///
    /// Returns `true` if the connection was present.
    pub async fn deregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(&id).is_some();
        if removed {
            tracing::debug!(connection_id = %id, live = connections.len(), "Connection deregistered");
        }
        removed
    }

    /// Apply `write` to every live connection and prune those for which
    /// it fails.
    ///
    /// The registry stays locked for the whole pass; `write` must not
    /// block.
    pub async fn for_each<F>(&self, mut write: F) -> FanOut
    where
        F: FnMut(&Connection) -> Result<(), WriteError>,
    {
        let mut connections = self.connections.lock().await;
        let mut report = FanOut::default();

        connections.retain(|id, connection| match write(connection) {
            Ok(()) => {
                report.delivered = report.delivered.saturating_add(1);
                true
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Pruning connection after failed write");
                report.pruned.push(*id);
                false
            }
        });

        report
    }

    /// Queue the same payload on every live connection.
    pub async fn deliver(&self, payload: &Payload) -> FanOut {
        self.for_each(|connection| connection.try_send(Arc::clone(payload)))
            .await
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Whether no connections are live.
    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }

    /// Whether `id` is currently registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }
}
