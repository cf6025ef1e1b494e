//! Inbound WebSocket messages and the commands they decode into.
//!
//! Every inbound frame is a JSON object tagged by an `action` field.
//! Decoding happens in two passes (see `todosync_server::protocol`): the
//! [`Envelope`] is read first to pick an [`Action`], then the frame is
//! decoded again into the action-specific message struct. Unknown
//! fields are ignored in both passes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ItemId;

/// The `action` discriminator of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Action {
    /// Create an item.
    Add,
    /// Replace an item's text.
    Edit,
    /// Remove an item.
    Delete,
    /// Flip an item's completion flag.
    Complete,
}

impl Action {
    /// Parse a wire discriminator. Returns `None` for anything
    /// other than the four known actions.
    pub fn from_wire(action: &str) -> Option<Self> {
        match action {
            "add" => Some(Self::Add),
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// The wire spelling of this action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Complete => "complete",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First-pass view of an inbound frame: only the discriminator.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Raw `action` value, checked with [`Action::from_wire`].
    pub action: String,
}

/// `{"action":"add","text":...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AddMessage {
    /// Content of the new item. Empty text is accepted.
    pub text: String,
}

/// `{"action":"edit","id":...,"text":...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EditMessage {
    /// Target item.
    pub id: ItemId,
    /// Replacement content.
    pub text: String,
}

/// `{"action":"delete","id":...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeleteMessage {
    /// Target item.
    pub id: ItemId,
}

/// `{"action":"complete","id":...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CompleteMessage {
    /// Target item.
    pub id: ItemId,
}

/// A fully decoded client intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert a new item with `complete = false`.
    Add {
        /// Content of the new item.
        text: String,
    },
    /// Overwrite the item's text and reset `complete` to `false`.
    Edit {
        /// Target item.
        id: ItemId,
        /// Replacement content.
        text: String,
    },
    /// Remove the item. Absent ids are not an error.
    Delete {
        /// Target item.
        id: ItemId,
    },
    /// Atomically negate the item's completion flag.
    Complete {
        /// Target item.
        id: ItemId,
    },
}

impl Command {
    /// The discriminator this command was decoded from.
    pub const fn action(&self) -> Action {
        match self {
            Self::Add { .. } => Action::Add,
            Self::Edit { .. } => Action::Edit,
            Self::Delete { .. } => Action::Delete,
            Self::Complete { .. } => Action::Complete,
        }
    }

    /// The item this command targets, if it targets an existing one.
    pub const fn target(&self) -> Option<ItemId> {
        match self {
            Self::Add { .. } => None,
            Self::Edit { id, .. } | Self::Delete { id } | Self::Complete { id } => Some(*id),
        }
    }
}

impl From<AddMessage> for Command {
    fn from(msg: AddMessage) -> Self {
        Self::Add { text: msg.text }
    }
}

impl From<EditMessage> for Command {
    fn from(msg: EditMessage) -> Self {
        Self::Edit {
            id: msg.id,
            text: msg.text,
        }
    }
}

impl From<DeleteMessage> for Command {
    fn from(msg: DeleteMessage) -> Self {
        Self::Delete { id: msg.id }
    }
}

impl From<CompleteMessage> for Command {
    fn from(msg: CompleteMessage) -> Self {
        Self::Complete { id: msg.id }
    }
}
