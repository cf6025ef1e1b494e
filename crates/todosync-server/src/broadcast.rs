//! Full-state fan-out to every live connection.
//!
//! A broadcast reads the complete item list from the store, serializes it
//! once, and queues the identical payload on every registered connection.
//! Broadcasts are snapshots, never deltas: whichever snapshot a client
//! received last is its view of the list.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::registry::Payload;
use crate::state::AppState;

/// Why a broadcast was abandoned before any connection was written to.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// Reading the item list failed.
    #[error("store read failed: {0}")]
    Store(#[from] todosync_db::DbError),

    /// The item list could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What one broadcast did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of items in the snapshot.
    pub items: usize,
    /// Connections the snapshot was queued on.
    pub delivered: usize,
    /// Connections removed because the write failed.
    pub pruned: usize,
}

/// Push the current item list to every live connection.
///
/// A failure to read or serialize the list aborts the whole broadcast;
/// no connection receives a partial fan-out. Individual write failures
/// only remove the failing connection.
///
/// # Errors
///
/// Returns [`BroadcastError`] if the store read or serialization fails.
pub async fn broadcast(state: &AppState) -> Result<BroadcastReport, BroadcastError> {
    let items = state.store.list_all().await.inspect_err(|e| {
        error!(error = %e, "Broadcast aborted: failed to read items");
    })?;

    let json = serde_json::to_string(&items).inspect_err(|e| {
        error!(error = %e, "Broadcast aborted: failed to serialize items");
    })?;
    let payload: Payload = Arc::from(json);

    let fan_out = state.registry.deliver(&payload).await;
    if !fan_out.pruned.is_empty() {
        warn!(
            pruned = fan_out.pruned.len(),
            "Dropped connections that failed to accept the broadcast"
        );
    }

    debug!(
        items = items.len(),
        recipients = fan_out.delivered,
        "Broadcast items"
    );

    Ok(BroadcastReport {
        items: items.len(),
        delivered: fan_out.delivered,
        pruned: fan_out.pruned.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use todosync_db::MemoryItemStore;

    use super::*;
    use crate::registry::Connection;

    #[tokio::test]
    async fn broadcast_sends_the_full_list_to_everyone() {
        let store = MemoryItemStore::new();
        store.insert("buy milk", false).await.unwrap();
        let state = AppState::new(store);

        let (a, mut a_out) = Connection::new(4);
        let (b, mut b_out) = Connection::new(4);
        state.registry.register(a).await;
        state.registry.register(b).await;

        let report = broadcast(&state).await.unwrap();
        assert_eq!(report.items, 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.pruned, 0);

        let expected = r#"[{"id":1,"text":"buy milk","complete":false}]"#;
        assert_eq!(a_out.recv().await.as_deref(), Some(expected));
        assert_eq!(b_out.recv().await.as_deref(), Some(expected));
    }

    #[tokio::test]
    async fn empty_store_broadcasts_an_empty_array() {
        let state = AppState::new(MemoryItemStore::new());
        let (conn, mut out) = Connection::new(4);
        state.registry.register(conn).await;

        broadcast(&state).await.unwrap();
        assert_eq!(out.recv().await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn store_failure_aborts_without_partial_fan_out() {
        let store = MemoryItemStore::new();
        let state = AppState::new(store.clone());
        let (conn, mut out) = Connection::new(4);
        state.registry.register(conn).await;

        store.set_offline(true);
        assert!(matches!(
            broadcast(&state).await,
            Err(BroadcastError::Store(_))
        ));
        assert!(out.try_recv().is_err());
        assert_eq!(state.registry.len().await, 1);
    }

    #[tokio::test]
    async fn failed_connection_is_pruned_and_skipped_afterwards() {
        let state = AppState::new(MemoryItemStore::new());
        let (alive, mut alive_out) = Connection::new(4);
        let (dead, dead_out) = Connection::new(4);
        let dead_id = dead.id();
        state.registry.register(alive).await;
        state.registry.register(dead).await;
        drop(dead_out);

        let report = broadcast(&state).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.pruned, 1);
        assert!(!state.registry.contains(dead_id).await);

        let report = broadcast(&state).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.pruned, 0);

        assert!(alive_out.recv().await.is_some());
        assert!(alive_out.recv().await.is_some());
    }
}
