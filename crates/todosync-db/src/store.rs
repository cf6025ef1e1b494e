//! The item store the sync engine and REST handlers call into.
//!
//! Uses enum dispatch instead of a trait object because async methods
//! are not dyn-compatible. Each method forwards to the concrete backend.

use todosync_types::{Item, ItemId};

use crate::error::DbError;
use crate::item_store::PgItemStore;
use crate::memory::MemoryItemStore;

/// Durable record of items.
#[derive(Debug, Clone)]
pub enum ItemStore {
    /// `PostgreSQL` `todos` table.
    Postgres(PgItemStore),
    /// In-process map.
    Memory(MemoryItemStore),
}

impl ItemStore {
    /// Every item, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend query fails.
    pub async fn list_all(&self) -> Result<Vec<Item>, DbError> {
        match self {
            Self::Postgres(store) => store.list_all().await,
            Self::Memory(store) => store.list_all().await,
        }
    }

    /// Fetch one item.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, DbError> {
        match self {
            Self::Postgres(store) => store.get(id).await,
            Self::Memory(store) => store.get(id).await,
        }
    }

    /// Insert a new item and return its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend insert fails.
    pub async fn insert(&self, text: &str, complete: bool) -> Result<ItemId, DbError> {
        match self {
            Self::Postgres(store) => store.insert(text, complete).await,
            Self::Memory(store) => store.insert(text, complete).await,
        }
    }

    /// Overwrite both fields of an item. Returns `false` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend update fails.
    pub async fn update_text(
        &self,
        id: ItemId,
        text: &str,
        complete: bool,
    ) -> Result<bool, DbError> {
        match self {
            Self::Postgres(store) => store.update_text(id, text, complete).await,
            Self::Memory(store) => store.update_text(id, text, complete).await,
        }
    }

    /// Set the completion flag. Returns `false` if the item is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend update fails.
    pub async fn update_complete(&self, id: ItemId, complete: bool) -> Result<bool, DbError> {
        match self {
            Self::Postgres(store) => store.update_complete(id, complete).await,
            Self::Memory(store) => store.update_complete(id, complete).await,
        }
    }

    /// Atomically negate the completion flag.
    ///
    /// Returns the new value, or `None` if the item is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend update fails.
    pub async fn toggle_complete(&self, id: ItemId) -> Result<Option<bool>, DbError> {
        match self {
            Self::Postgres(store) => store.toggle_complete(id).await,
            Self::Memory(store) => store.toggle_complete(id).await,
        }
    }

    /// Delete an item unconditionally. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend delete fails.
    pub async fn delete(&self, id: ItemId) -> Result<bool, DbError> {
        match self {
            Self::Postgres(store) => store.delete(id).await,
            Self::Memory(store) => store.delete(id).await,
        }
    }

    /// Human-readable backend name for logging.
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<PgItemStore> for ItemStore {
    fn from(store: PgItemStore) -> Self {
        Self::Postgres(store)
    }
}

impl From<MemoryItemStore> for ItemStore {
    fn from(store: MemoryItemStore) -> Self {
        Self::Memory(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_dispatch() {
        let store = ItemStore::from(MemoryItemStore::new());
        assert_eq!(store.backend_name(), "memory");

        let id = store.insert("buy milk", false).await.unwrap();
        assert!(store.update_text(id, "buy milk and eggs", false).await.unwrap());
        assert_eq!(store.toggle_complete(id).await.unwrap(), Some(true));

        let item = store.get(id).await.unwrap().unwrap();
        assert_eq!(item.text, "buy milk and eggs");
        assert!(item.complete);

        assert!(store.delete(id).await.unwrap());
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
