//! Shared type definitions for todosync.
//!
//! This crate is the single source of truth for the records and wire
//! messages exchanged between the server and its clients. Types flow
//! downstream to `TypeScript` via `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- [`ItemId`] and [`ConnectionId`]
//! - [`structs`] -- [`Item`] and the REST request bodies
//! - [`commands`] -- Inbound WebSocket messages and the decoded [`Command`]

pub mod commands;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use commands::{
    Action, AddMessage, Command, CompleteMessage, DeleteMessage, EditMessage, Envelope,
};
pub use ids::{ConnectionId, ItemId};
pub use structs::{Item, ItemPatch, NewItem};
