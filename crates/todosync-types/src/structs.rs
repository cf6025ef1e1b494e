//! Item records and the request bodies that create or overwrite them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ItemId;

/// A single synchronized to-do item.
///
/// The Store is the only authority on an item's existence and field
/// values. The sync engine never holds on to an `Item` across
/// mutations; every broadcast re-reads the full list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Item {
    /// Store-assigned identifier.
    pub id: ItemId,
    /// User-supplied content.
    pub text: String,
    /// Completion flag, toggled independently of text edits.
    pub complete: bool,
}

/// Body of `POST /todos`.
///
/// Any `id` field the client sends is ignored; the Store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewItem {
    /// Content of the new item.
    pub text: String,
    /// Initial completion flag (defaults to `false`).
    #[serde(default)]
    pub complete: bool,
}

/// Body of `PATCH /todos/{id}`: overwrites both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemPatch {
    /// Replacement content.
    pub text: String,
    /// Replacement completion flag.
    #[serde(default)]
    pub complete: bool,
}
