//! Filter storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::PhoneEventFilter;
use crate::Result;
use crate::ports::FilterStore;

/// Repository holding the single filter document.
///
/// The whole filter is stored as one JSON row, so a save never leaves a
/// partially updated filter behind.
pub struct FilterRepository {
    pool: SqlitePool,
}

impl FilterRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS phone_event_filter (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the stored filter, or the default filter if none was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored document is malformed.
    pub async fn get(&self) -> Result<PhoneEventFilter> {
        let row = sqlx::query("SELECT body FROM phone_event_filter WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(serde_json::from_str(&body)?)
            }
            None => {
                debug!("No stored filter, using defaults");
                Ok(PhoneEventFilter::default())
            }
        }
    }

    /// Replace the stored filter.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub async fn set(&self, filter: &PhoneEventFilter) -> Result<()> {
        let body = serde_json::to_string(filter)?;

        sqlx::query(
            r"
            INSERT INTO phone_event_filter (id, body) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(&body)
        .execute(&self.pool)
        .await?;

        debug!("Saved filter ({} bytes)", body.len());
        Ok(())
    }
}

impl FilterStore for FilterRepository {
    async fn load(&self) -> Result<PhoneEventFilter> {
        self.get().await
    }

    async fn save(&self, filter: &PhoneEventFilter) -> Result<()> {
        self.set(filter).await
    }
}
