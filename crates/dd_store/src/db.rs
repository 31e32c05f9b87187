//! SQLite mailbox via sqlx.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use dd_proto::message::{Message, MessageStatus, User};

use crate::error::StoreError;
use crate::mailbox::MailboxIndex;
use crate::models::{MessageRow, UserRow};

/// Central store handle.  Cheap to clone (Arc internally).
#[derive(Clone)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    /// Open (or create) the SQLite database at `db_path`.
    /// Runs all pending migrations automatically.
    ///
    /// WAL journal mode is configured at connection time, NOT inside a
    /// migration — SQLite forbids changing `journal_mode` inside a
    /// transaction and sqlx wraps every migration in one.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory database for tests and throwaway runs. Pinned to a single
    /// connection — each `sqlite::memory:` connection is its own database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))
    }
}

fn rows_to_messages(rows: Vec<MessageRow>) -> Result<Vec<Message>, StoreError> {
    rows.into_iter().map(Message::try_from).collect()
}

#[async_trait]
impl MailboxIndex for Store {
    async fn create_message(
        &self,
        from: &str,
        to: &str,
        envelope: &str,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO messages (id, from_user, to_user, envelope, status, sent_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(from)
        .bind(to)
        .bind(envelope)
        .bind(MessageStatus::Unread.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!(target: "dd_store", event = "message_created", message_id = %id);
        Ok(id)
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>, StoreError> {
        let row: Option<MessageRow> = sqlx::query_as(
            "SELECT id, from_user, to_user, envelope, status, sent_at \
             FROM messages WHERE id = ? LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Message::try_from).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: MessageStatus,
        new: MessageStatus,
    ) -> Result<bool, StoreError> {
        // The WHERE clause carries the expectation; rows_affected tells us
        // whether this caller won. Never a read-then-write.
        let result = sqlx::query("UPDATE messages SET status = ? WHERE id = ? AND status = ?")
            .bind(new.as_str())
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_unread(&self, user: &str) -> Result<Vec<Message>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, from_user, to_user, envelope, status, sent_at \
             FROM messages WHERE to_user = ? AND status = 'unread' \
             ORDER BY sent_at DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows_to_messages(rows)
    }

    async fn list_unread_from(
        &self,
        user: &str,
        sender: &str,
    ) -> Result<Vec<Message>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, from_user, to_user, envelope, status, sent_at \
             FROM messages WHERE to_user = ? AND from_user = ? AND status = 'unread' \
             ORDER BY sent_at DESC",
        )
        .bind(user)
        .bind(sender)
        .fetch_all(&self.pool)
        .await?;

        rows_to_messages(rows)
    }

    async fn unread_count(&self, user: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE to_user = ? AND status = 'unread'",
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn create_user(&self, username: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT OR IGNORE INTO users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_users(&self, exclude: Option<&str>) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = if let Some(excluded) = exclude {
            sqlx::query_as(
                "SELECT username, created_at FROM users WHERE username != ? ORDER BY username",
            )
            .bind(excluded)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as("SELECT username, created_at FROM users ORDER BY username")
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows.into_iter().map(User::from).collect())
    }
}
