//! In-process item store.
//!
//! Backs the server when `store.backend: memory` is configured and
//! stands in for `PostgreSQL` in tests. Every operation runs under one
//! [`Mutex`], which gives the same per-statement atomicity the
//! `PostgreSQL` store provides (including the single-step toggle).
//!
//! The store can be switched offline to exercise the failure paths of
//! its callers: while offline every operation returns
//! [`DbError::Unavailable`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use todosync_types::{Item, ItemId};
use tokio::sync::Mutex;

use crate::error::DbError;

#[derive(Debug)]
struct Inner {
    items: BTreeMap<ItemId, Item>,
    next_id: i64,
}

/// Item store held entirely in memory. Clones share the same items.
#[derive(Debug, Clone)]
pub struct MemoryItemStore {
    inner: Arc<Mutex<Inner>>,
    offline: Arc<AtomicBool>,
}

impl MemoryItemStore {
    /// Create an empty store. The first inserted item gets id 1.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                items: BTreeMap::new(),
                next_id: 1,
            })),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent operation fail (`true`) or succeed again
    /// (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), DbError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(String::from("memory store is offline")));
        }
        Ok(())
    }

    /// Every item, ordered by id ascending.
    pub async fn list_all(&self) -> Result<Vec<Item>, DbError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner.items.values().cloned().collect())
    }

    /// Fetch one item.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, DbError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner.items.get(&id).cloned())
    }

    /// Insert a new item and return its assigned id.
    pub async fn insert(&self, text: &str, complete: bool) -> Result<ItemId, DbError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let id = ItemId(inner.next_id);
        inner.next_id = inner
            .next_id
            .checked_add(1)
            .ok_or_else(|| DbError::Unavailable(String::from("item id space exhausted")))?;
        inner.items.insert(
            id,
            Item {
                id,
                text: text.to_owned(),
                complete,
            },
        );
        Ok(id)
    }

    /// Overwrite both fields of an item. Returns `false` if it is absent.
    pub async fn update_text(
        &self,
        id: ItemId,
        text: &str,
        complete: bool,
    ) -> Result<bool, DbError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        Ok(inner.items.get_mut(&id).is_some_and(|item| {
            text.clone_into(&mut item.text);
            item.complete = complete;
            true
        }))
    }

    /// Set the completion flag. Returns `false` if the item is absent.
    pub async fn update_complete(&self, id: ItemId, complete: bool) -> Result<bool, DbError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        Ok(inner.items.get_mut(&id).is_some_and(|item| {
            item.complete = complete;
            true
        }))
    }

    /// Negate the completion flag under the store lock.
    ///
    /// Returns the new value, or `None` if the item is absent.
    pub async fn toggle_complete(&self, id: ItemId) -> Result<Option<bool>, DbError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        Ok(inner.items.get_mut(&id).map(|item| {
            item.complete = !item.complete;
            item.complete
        }))
    }

    /// Delete an item. Returns whether it was present.
    pub async fn delete(&self, id: ItemId) -> Result<bool, DbError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        Ok(inner.items.remove(&id).is_some())
    }
}

impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}
