//! `PostgreSQL`-backed item persistence.
//!
//! All statements target the single `todos` table. The completion toggle
//! is issued as one conditional `UPDATE ... SET complete = NOT complete`
//! so concurrent toggles on the same row serialize inside `PostgreSQL`
//! and none of them is lost.

use sqlx::PgPool;
use todosync_types::{Item, ItemId};

use crate::error::DbError;

/// Operations on the `todos` table.
#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    /// Create a new item store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every item, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Item>, DbError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"SELECT id, text, complete
              FROM todos
              ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Fetch one item.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, DbError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"SELECT id, text, complete
              FROM todos
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    /// Insert a new item and return its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, text: &str, complete: bool) -> Result<ItemId, DbError> {
        let row: (i64,) = sqlx::query_as(
            r"INSERT INTO todos (text, complete)
              VALUES ($1, $2)
              RETURNING id",
        )
        .bind(text)
        .bind(complete)
        .fetch_one(&self.pool)
        .await?;

        Ok(ItemId(row.0))
    }

    /// Overwrite both fields of an item. Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn update_text(
        &self,
        id: ItemId,
        text: &str,
        complete: bool,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(r"UPDATE todos SET text = $1, complete = $2 WHERE id = $3")
            .bind(text)
            .bind(complete)
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the completion flag. Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn update_complete(&self, id: ItemId, complete: bool) -> Result<bool, DbError> {
        let result = sqlx::query(r"UPDATE todos SET complete = $1 WHERE id = $2")
            .bind(complete)
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Negate the completion flag in a single statement.
    ///
    /// Returns the new value, or `None` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn toggle_complete(&self, id: ItemId) -> Result<Option<bool>, DbError> {
        let row: Option<(bool,)> = sqlx::query_as(
            r"UPDATE todos
              SET complete = NOT complete
              WHERE id = $1
              RETURNING complete",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(complete,)| complete))
    }

    /// Delete an item. Absent ids are not an error; returns whether a
    /// row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn delete(&self, id: ItemId) -> Result<bool, DbError> {
        let result = sqlx::query(r"DELETE FROM todos WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// A row from the `todos` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    /// Row id (`BIGSERIAL`).
    pub id: i64,
    /// Item content.
    pub text: String,
    /// Completion flag.
    pub complete: bool,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId(row.id),
            text: row.text,
            complete: row.complete,
        }
    }
}
