//! Event history storage repository.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::{Direction, EventId, EventState, GeoCoordinates, PhoneEvent, StateReason};
use crate::Result;
use crate::ports::EventStore;

const EVENT_COLUMNS: &str = "id, phone, direction, missed, start_time, end_time, text, \
                             latitude, longitude, state, state_reason, is_read";

/// Repository for phone events and their delivery state.
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
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
            CREATE TABLE IF NOT EXISTS phone_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone TEXT NOT NULL,
                direction TEXT NOT NULL,
                missed INTEGER NOT NULL DEFAULT 0,
                start_time INTEGER NOT NULL,
                end_time INTEGER,
                text TEXT,
                latitude REAL,
                longitude REAL,
                state TEXT NOT NULL DEFAULT 'pending',
                state_reason INTEGER NOT NULL DEFAULT 0,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_phone_events_pending
            ON phone_events(start_time) WHERE state = 'pending'
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: EventId) -> Result<Option<PhoneEvent>> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM phone_events WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_event))
    }

    /// Insert a new event or overwrite an existing one.
    ///
    /// Returns the event's ID (newly assigned for inserts).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn save(&self, event: &PhoneEvent) -> Result<EventId> {
        let latitude = event.location.map(|l| l.latitude);
        let longitude = event.location.map(|l| l.longitude);

        if let Some(id) = event.id {
            let updated = sqlx::query(
                r"
                UPDATE phone_events
                SET phone = ?, direction = ?, missed = ?, start_time = ?, end_time = ?,
                    text = ?, latitude = ?, longitude = ?, state = ?, state_reason = ?,
                    is_read = ?
                WHERE id = ?
                ",
            )
            .bind(&event.phone)
            .bind(event.direction.as_str())
            .bind(event.missed)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(&event.text)
            .bind(latitude)
            .bind(longitude)
            .bind(event.state.as_str())
            .bind(i64::from(event.state_reason.bits()))
            .bind(event.read)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

            if updated.rows_affected() > 0 {
                return Ok(id);
            }
            debug!("Event {id} not found, inserting it with its id");
        }

        let result = sqlx::query(
            r"
            INSERT INTO phone_events
                (id, phone, direction, missed, start_time, end_time, text,
                 latitude, longitude, state, state_reason, is_read)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(event.id.map(|id| id.0))
        .bind(&event.phone)
        .bind(event.direction.as_str())
        .bind(event.missed)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.text)
        .bind(latitude)
        .bind(longitude)
        .bind(event.state.as_str())
        .bind(i64::from(event.state_reason.bits()))
        .bind(event.read)
        .execute(&self.pool)
        .await?;

        let id = EventId::new(result.last_insert_rowid());
        debug!("Stored event {id} ({})", event.state);
        Ok(id)
    }

    /// Get events waiting for delivery, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending(&self) -> Result<Vec<PhoneEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM phone_events WHERE state = 'pending' \
             ORDER BY start_time ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    /// Get the most recent events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recent(&self, limit: u32) -> Result<Vec<PhoneEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM phone_events ORDER BY start_time DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    /// Update the delivery state of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn set_state(&self, id: EventId, state: EventState) -> Result<()> {
        sqlx::query("UPDATE phone_events SET state = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        debug!("Event {id} is now {state}");
        Ok(())
    }

    /// Mark one event as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn mark_read(&self, id: EventId) -> Result<()> {
        sqlx::query("UPDATE phone_events SET is_read = 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark every event as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn mark_all_read(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE phone_events SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count events not yet marked read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub async fn count_unread(&self) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS unread FROM phone_events WHERE is_read = 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("unread") as u32)
    }

    /// Trim the history down to the `keep` most recent events.
    ///
    /// This is an administrative operation, not a state transition; pending
    /// events beyond the capacity are dropped like any other.
    ///
    /// Returns the number of deleted events.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn purge(&self, keep: u32) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM phone_events
            WHERE id NOT IN (
                SELECT id FROM phone_events ORDER BY start_time DESC, id DESC LIMIT ?
            )
            ",
        )
        .bind(i64::from(keep))
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            debug!("Purged {deleted} events, keeping {keep}");
        }
        Ok(deleted)
    }
}

impl EventStore for EventRepository {
    async fn get(&self, id: EventId) -> Result<Option<PhoneEvent>> {
        self.find(id).await
    }

    async fn put(&self, event: &PhoneEvent) -> Result<EventId> {
        self.save(event).await
    }

    async fn list_pending(&self) -> Result<Vec<PhoneEvent>> {
        self.pending().await
    }

    async fn update_state(&self, id: EventId, state: EventState) -> Result<()> {
        self.set_state(id, state).await
    }
}

/// Convert a database row to a `PhoneEvent`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> PhoneEvent {
    let latitude: Option<f64> = row.get("latitude");
    let longitude: Option<f64> = row.get("longitude");

    PhoneEvent {
        id: Some(EventId::new(row.get("id"))),
        phone: row.get("phone"),
        direction: Direction::parse(row.get("direction")),
        missed: row.get("missed"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        text: row.get("text"),
        location: latitude
            .zip(longitude)
            .map(|(lat, lon)| GeoCoordinates::new(lat, lon)),
        state: EventState::parse(row.get("state")),
        state_reason: StateReason::from_bits(row.get::<i64, _>("state_reason") as u32),
        read: row.get("is_read"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sms(phone: &str, at: i64) -> PhoneEvent {
        PhoneEvent::incoming_sms(phone, "hello", at)
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_roundtrips() {
        let repo = EventRepository::in_memory().await.unwrap();
        let mut event = sms("+15551234", 1_000);
        event.location = Some(GeoCoordinates::new(51.5, -0.12));

        let id = repo.save(&event).await.unwrap();
        event.id = Some(id);

        let loaded = repo.find(id).await.unwrap().unwrap();
        assert_eq!(loaded, event);
    }

    #[tokio::test]
    async fn test_save_existing_updates_in_place() {
        let repo = EventRepository::in_memory().await.unwrap();
        let mut event = sms("555", 1_000);
        event.id = Some(repo.save(&event).await.unwrap());

        event.state = EventState::Processed;
        let id = repo.save(&event).await.unwrap();

        assert_eq!(Some(id), event.id);
        assert_eq!(repo.recent(10).await.unwrap().len(), 1);
        assert_eq!(
            repo.find(id).await.unwrap().unwrap().state,
            EventState::Processed
        );
    }

    #[tokio::test]
    async fn test_pending_lists_oldest_first() {
        let repo = EventRepository::in_memory().await.unwrap();
        repo.save(&sms("2", 2_000)).await.unwrap();
        repo.save(&sms("1", 1_000)).await.unwrap();
        let mut ignored = sms("3", 500);
        ignored.apply_classification(StateReason::REJECTED_BY_BLACKLIST);
        repo.save(&ignored).await.unwrap();

        let pending = repo.pending().await.unwrap();
        let phones: Vec<&str> = pending.iter().map(|e| e.phone.as_str()).collect();
        assert_eq!(phones, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_set_state_removes_from_pending() {
        let repo = EventRepository::in_memory().await.unwrap();
        let id = repo.save(&sms("555", 1_000)).await.unwrap();

        repo.set_state(id, EventState::Processed).await.unwrap();

        assert!(repo.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_flags() {
        let repo = EventRepository::in_memory().await.unwrap();
        let first = repo.save(&sms("1", 1_000)).await.unwrap();
        repo.save(&sms("2", 2_000)).await.unwrap();

        repo.mark_read(first).await.unwrap();
        assert_eq!(repo.count_unread().await.unwrap(), 1);

        assert_eq!(repo.mark_all_read().await.unwrap(), 1);
        assert_eq!(repo.count_unread().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_keeps_most_recent() {
        let repo = EventRepository::in_memory().await.unwrap();
        for at in 1..=5 {
            repo.save(&sms(&at.to_string(), at * 1_000)).await.unwrap();
        }

        assert_eq!(repo.purge(2).await.unwrap(), 3);

        let phones: Vec<String> = repo
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.phone)
            .collect();
        assert_eq!(phones, vec!["5", "4"]);
    }
}
