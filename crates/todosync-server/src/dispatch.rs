//! Mutation dispatch: inbound frame → store operation → broadcast.
//!
//! [`handle_message`] is called by a connection's receive loop for every
//! inbound data frame and runs to completion (including the triggered
//! broadcast) before the loop reads the next frame. Nothing it does is
//! reported back to the sending client; the only visible effect of an
//! accepted command is the next broadcast.
//!
//! | Command | Store operation | Notes |
//! |---------|-----------------|-------|
//! | `Add(text)` | `insert(text, false)` | Empty text accepted |
//! | `Edit(id, text)` | `update_text(id, text, false)` | Editing resets `complete` |
//! | `Delete(id)` | `delete(id)` | Absent ids succeed |
//! | `Complete(id)` | `toggle_complete(id)` | Single atomic statement; absent ids fail |

use todosync_db::{DbError, ItemStore};
use todosync_types::{Command, ConnectionId, ItemId};
use tracing::{info, warn};

use crate::broadcast::{BroadcastError, BroadcastReport, broadcast};
use crate::protocol::{DecodeError, decode};
use crate::state::AppState;

/// Why an accepted command was not applied.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The store rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The command targets an item that does not exist.
    #[error("item {0} not found")]
    NotFound(ItemId),
}

/// What the store did for an applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new item was inserted.
    Added(ItemId),
    /// The item's text was replaced (`matched` is `false` if no row
    /// had that id).
    Edited {
        /// Target item.
        id: ItemId,
        /// Whether a row was updated.
        matched: bool,
    },
    /// The item was removed (`existed` is `false` if it was already gone).
    Deleted {
        /// Target item.
        id: ItemId,
        /// Whether a row was removed.
        existed: bool,
    },
    /// The item's completion flag now has value `complete`.
    Toggled {
        /// Target item.
        id: ItemId,
        /// The new flag value.
        complete: bool,
    },
}

/// End result of handling one inbound frame.
#[derive(Debug)]
pub enum Outcome {
    /// The frame could not be decoded and was dropped.
    Discarded(DecodeError),
    /// The command was decoded but the store did not apply it. No
    /// broadcast was issued.
    Failed(DispatchError),
    /// The command was applied and a broadcast was attempted.
    Applied {
        /// Store-level effect of the command.
        applied: Applied,
        /// Result of the triggered broadcast.
        broadcast: Result<BroadcastReport, BroadcastError>,
    },
}

impl Outcome {
    /// Whether the frame led to a successful broadcast.
    pub const fn broadcasted(&self) -> bool {
        matches!(
            self,
            Self::Applied {
                broadcast: Ok(_),
                ..
            }
        )
    }
}

/// Apply one command to the store.
///
/// # Errors
///
/// Returns [`DispatchError::Store`] if the store call fails, or
/// [`DispatchError::NotFound`] if a `Complete` targets a missing item.
pub async fn apply(store: &ItemStore, command: &Command) -> Result<Applied, DispatchError> {
    match command {
        Command::Add { text } => {
            let id = store.insert(text, false).await?;
            Ok(Applied::Added(id))
        }
        Command::Edit { id, text } => {
            let matched = store.update_text(*id, text, false).await?;
            Ok(Applied::Edited { id: *id, matched })
        }
        Command::Delete { id } => {
            let existed = store.delete(*id).await?;
            Ok(Applied::Deleted { id: *id, existed })
        }
        Command::Complete { id } => {
            let complete = store
                .toggle_complete(*id)
                .await?
                .ok_or(DispatchError::NotFound(*id))?;
            Ok(Applied::Toggled { id: *id, complete })
        }
    }
}

/// Decode, apply, and broadcast one inbound frame from `connection`.
pub async fn handle_message(state: &AppState, connection: ConnectionId, raw: &[u8]) -> Outcome {
    let command = match decode(raw) {
        Ok(command) => command,
        Err(e) => {
            warn!(connection_id = %connection, error = %e, "Discarding inbound frame");
            return Outcome::Discarded(e);
        }
    };

    let action = command.action();
    let applied = match apply(&state.store, &command).await {
        Ok(applied) => applied,
        Err(e) => {
            warn!(
                connection_id = %connection,
                %action,
                item_id = command.target().map(ItemId::into_inner),
                error = %e,
                "Command failed"
            );
            return Outcome::Failed(e);
        }
    };

    info!(connection_id = %connection, %action, ?applied, "Command applied");

    Outcome::Applied {
        applied,
        broadcast: broadcast(state).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use todosync_db::MemoryItemStore;

    use super::*;
    use crate::registry::{Connection, Outbox};

    async fn state_with_client() -> (Arc<AppState>, MemoryItemStore, ConnectionId, Outbox) {
        let store = MemoryItemStore::new();
        let state = Arc::new(AppState::new(store.clone()));
        let (conn, outbox) = Connection::new(16);
        let id = conn.id();
        state.registry.register(conn).await;
        (state, store, id, outbox)
    }

    #[tokio::test]
    async fn add_then_edit_resets_completion() {
        let (state, store, conn, mut out) = state_with_client().await;

        let outcome = handle_message(&state, conn, br#"{"action":"add","text":"buy milk"}"#).await;
        assert!(outcome.broadcasted());
        assert_eq!(
            out.recv().await.as_deref(),
            Some(r#"[{"id":1,"text":"buy milk","complete":false}]"#)
        );

        handle_message(&state, conn, br#"{"action":"complete","id":1}"#).await;
        assert_eq!(
            out.recv().await.as_deref(),
            Some(r#"[{"id":1,"text":"buy milk","complete":true}]"#)
        );

        handle_message(
            &state,
            conn,
            br#"{"action":"edit","id":1,"text":"buy milk and eggs"}"#,
        )
        .await;
        assert_eq!(
            out.recv().await.as_deref(),
            Some(r#"[{"id":1,"text":"buy milk and eggs","complete":false}]"#)
        );

        let items = store.list_all().await.unwrap();
        assert!(!items[0].complete);
    }

    #[tokio::test]
    async fn repeated_delete_broadcasts_each_time() {
        let (state, store, conn, mut out) = state_with_client().await;
        store.insert("x", false).await.unwrap();

        for expect_existed in [true, false] {
            match handle_message(&state, conn, br#"{"action":"delete","id":1}"#).await {
                Outcome::Applied {
                    applied: Applied::Deleted { existed, .. },
                    broadcast: Ok(report),
                } => {
                    assert_eq!(existed, expect_existed);
                    assert_eq!(report.delivered, 1);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
            assert_eq!(out.recv().await.as_deref(), Some("[]"));
        }
        assert!(out.try_recv().is_err());
    }

    #[tokio::test]
    async fn edit_of_missing_item_still_broadcasts() {
        let (state, _store, conn, mut out) = state_with_client().await;
        let outcome = handle_message(&state, conn, br#"{"action":"edit","id":9,"text":"x"}"#).await;
        assert!(matches!(
            outcome,
            Outcome::Applied {
                applied: Applied::Edited { matched: false, .. },
                ..
            }
        ));
        assert_eq!(out.recv().await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn complete_of_missing_item_fails_without_broadcast() {
        let (state, _store, conn, mut out) = state_with_client().await;
        let outcome = handle_message(&state, conn, br#"{"action":"complete","id":9}"#).await;
        assert!(matches!(
            outcome,
            Outcome::Failed(DispatchError::NotFound(ItemId(9)))
        ));
        assert!(out.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_frames_are_discarded_silently() {
        let (state, store, conn, mut out) = state_with_client().await;
        for raw in [
            &b"not json"[..],
            br#"{"action":"shout","text":"hi"}"#,
            br#"{"action":"edit","text":"no id"}"#,
        ] {
            let outcome = handle_message(&state, conn, raw).await;
            assert!(matches!(outcome, Outcome::Discarded(_)));
        }
        assert!(out.try_recv().is_err());
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(state.registry.contains(conn).await);
    }

    #[tokio::test]
    async fn store_failure_aborts_command_without_broadcast() {
        let (state, store, conn, mut out) = state_with_client().await;
        store.set_offline(true);
        let outcome = handle_message(&state, conn, br#"{"action":"add","text":"x"}"#).await;
        assert!(matches!(outcome, Outcome::Failed(DispatchError::Store(_))));
        assert!(out.try_recv().is_err());
        assert!(state.registry.contains(conn).await);
    }

    #[tokio::test]
    async fn one_add_reaches_every_connection_with_identical_payload() {
        let (state, _store, conn, mut first) = state_with_client().await;
        let mut outboxes = Vec::new();
        for _ in 0..4 {
            let (c, o) = Connection::new(16);
            state.registry.register(c).await;
            outboxes.push(o);
        }

        let outcome = handle_message(&state, conn, br#"{"action":"add","text":"shared"}"#).await;
        match outcome {
            Outcome::Applied {
                broadcast: Ok(report),
                ..
            } => assert_eq!(report.delivered, 5),
            other => panic!("unexpected outcome {other:?}"),
        }

        let expected = first.recv().await.unwrap();
        for outbox in &mut outboxes {
            assert_eq!(outbox.recv().await.unwrap(), expected);
            assert!(outbox.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn concurrent_completes_do_not_lose_updates() {
        let (state, store, conn, _out) = state_with_client().await;
        for text in ["a", "b", "c", "d", "race"] {
            store.insert(text, false).await.unwrap();
        }
        let id = ItemId(5);

        let a = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                handle_message(&state, conn, br#"{"action":"complete","id":5}"#).await
            })
        };
        let b = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                handle_message(&state, conn, br#"{"action":"complete","id":5}"#).await
            })
        };

        let mut seen = Vec::new();
        for handle in [a, b] {
            match handle.await.unwrap() {
                Outcome::Applied {
                    applied: Applied::Toggled { complete, .. },
                    ..
                } => seen.push(complete),
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        // Both toggles were recorded: one observed `true`, the other `false`.
        seen.sort_unstable();
        assert_eq!(seen, vec![false, true]);
        assert!(!store.get(id).await.unwrap().unwrap().complete);
    }

    #[tokio::test]
    async fn sequential_commands_leave_clients_matching_the_store() {
        let (state, store, conn, mut out) = state_with_client().await;
        let frames: [&[u8]; 6] = [
            br#"{"action":"add","text":"a"}"#,
            br#"{"action":"add","text":"b"}"#,
            br#"{"action":"complete","id":2}"#,
            br#"{"action":"edit","id":1,"text":"a2"}"#,
            br#"{"action":"delete","id":1}"#,
            br#"{"action":"add","text":"c"}"#,
        ];

        let mut last = None;
        for frame in frames {
            assert!(handle_message(&state, conn, frame).await.broadcasted());
            last = out.recv().await;
        }

        let expected = serde_json::to_string(&store.list_all().await.unwrap()).unwrap();
        assert_eq!(last.as_deref(), Some(expected.as_str()));
    }
}
