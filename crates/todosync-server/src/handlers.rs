//! REST endpoint handlers.
//!
//! Plain request/response CRUD over the same store the sync engine uses.
//! These handlers do not broadcast; WebSocket clients pick up their
//! effects with the next broadcast triggered by a WebSocket command.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and live connection count |
//! | `GET` | `/todos` | List all items |
//! | `POST` | `/todos` | Create an item |
//! | `PATCH` | `/todos/{id}` | Overwrite an item's text and flag |
//! | `DELETE` | `/todos/{id}` | Delete an item |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use todosync_types::{Item, ItemId, ItemPatch, NewItem};

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a path segment into an [`ItemId`].
fn parse_id(raw: &str) -> Result<ItemId, ApiError> {
    raw.parse::<i64>()
        .map(ItemId)
        .map_err(|e| ApiError::InvalidId(format!("{raw}: {e}")))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness, the store backend, and how many clients are connected.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "store": state.store.backend_name(),
        "connections": state.registry.len().await,
    }))
}

// ---------------------------------------------------------------------------
// GET /todos
// ---------------------------------------------------------------------------

/// List every item, ordered by id.
pub async fn list_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.store.list_all().await?))
}

// ---------------------------------------------------------------------------
// POST /todos
// ---------------------------------------------------------------------------

/// Create an item and return it with its assigned id.
pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.store.insert(&body.text, body.complete).await?;
    tracing::info!(item_id = %id, "Item created via REST");

    let item = Item {
        id,
        text: body.text,
        complete: body.complete,
    };
    Ok((StatusCode::CREATED, Json(item)))
}

// ---------------------------------------------------------------------------
// PATCH /todos/{id}
// ---------------------------------------------------------------------------

/// Overwrite both fields of an item.
pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Json(body): Json<ItemPatch>,
) -> Result<Json<Item>, ApiError> {
    let id = parse_id(&raw_id)?;
    if !state.store.update_text(id, &body.text, body.complete).await? {
        return Err(ApiError::NotFound(format!("item {id}")));
    }
    tracing::info!(item_id = %id, "Item updated via REST");

    Ok(Json(Item {
        id,
        text: body.text,
        complete: body.complete,
    }))
}

// ---------------------------------------------------------------------------
// DELETE /todos/{id}
// ---------------------------------------------------------------------------

/// Delete an item. Deleting an absent item still succeeds.
pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let existed = state.store.delete(id).await?;
    tracing::info!(item_id = %id, existed, "Item deleted via REST");

    Ok(Json(serde_json::json!({
        "message": "Todo deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_integers_only() {
        assert!(matches!(parse_id("42"), Ok(ItemId(42))));
        assert!(matches!(parse_id("-1"), Ok(ItemId(-1))));
        assert!(matches!(parse_id("abc"), Err(ApiError::InvalidId(_))));
        assert!(matches!(parse_id("1.5"), Err(ApiError::InvalidId(_))));
    }
}
