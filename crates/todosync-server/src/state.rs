//! Shared application state for the todosync server.
//!
//! [`AppState`] ties the [`ItemStore`] (the only source of item data) to
//! the [`Registry`] of live connections. It holds nothing else: every
//! view clients see is derived from the store plus the live set.

use todosync_db::ItemStore;

use crate::registry::Registry;

/// Default capacity of each connection's outbound queue.
///
/// A client that falls this many broadcasts behind is treated as a
/// failed write and disconnected.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug)]
pub struct AppState {
    /// Durable item store shared by the sync engine and REST handlers.
    pub store: ItemStore,
    /// Live WebSocket connections.
    pub registry: Registry,
    /// Capacity of each new connection's outbound queue.
    pub outbound_buffer: usize,
}

impl AppState {
    /// Create state around a store with an empty registry.
    pub fn new(store: impl Into<ItemStore>) -> Self {
        Self {
            store: store.into(),
            registry: Registry::new(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    /// Override the per-connection outbound queue capacity.
    #[must_use]
    pub const fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = capacity;
        self
    }
}
