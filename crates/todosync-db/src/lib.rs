//! Data layer for todosync.
//!
//! The [`ItemStore`] is the durable record of items. The sync engine and
//! the REST handlers both call into it and never cache what it returns.
//!
//! # Backends
//!
//! ```text
//! ItemStore
//!     |
//!     +-- Postgres --> PgItemStore (todos table, via PostgresPool)
//!     |
//!     +-- Memory ----> MemoryItemStore (single-process, tests)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- [`ItemStore`] enum dispatch
//! - [`item_store`] -- `PostgreSQL` queries on the `todos` table
//! - [`memory`] -- In-memory backend
//! - [`postgres`] -- `PostgreSQL` settings, connection pool, migrations
//! - [`error`] -- Shared error types

pub mod error;
pub mod item_store;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use item_store::{ItemRow, PgItemStore};
pub use memory::MemoryItemStore;
pub use postgres::{DatabaseConfig, PostgresPool};
pub use store::ItemStore;
