//! Live list synchronization server.
//!
//! This crate provides an Axum HTTP server that keeps every connected
//! WebSocket client in sync with the item list held by the store:
//!
//! - **`WebSocket` endpoint** (`/ws`) accepting `add`, `edit`, `delete`,
//!   and `complete` commands and pushing the full item list to every
//!   client after each accepted command
//! - **REST endpoints** (`/todos`) for plain CRUD over the same store
//!
//! # Architecture
//!
//! ```text
//! client frame
//!     |
//!     +-- ws (receive loop, one task per connection)
//!         |
//!         +-- protocol::decode --> Command (or discard)
//!         +-- dispatch::apply  --> ItemStore
//!         +-- broadcast        --> ItemStore::list_all
//!             |
//!             +-- Registry::deliver --> every connection's outbound queue
//! ```
//!
//! The server holds no item state of its own. Each broadcast re-reads
//! the store, so clients always converge on the store's contents.

pub mod broadcast;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::{ConfigError, StoreBackend, TodosyncConfig};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, shutdown_signal, start_server};
pub use startup::{RunningServer, StartupError, spawn_server};
pub use state::AppState;
