//! SQLite store.
//!
//! Uses a single SQLite database file with two tables:
//! - `threads` — thread metadata with the agent profile as a JSON column
//! - `messages` — one row per message, content blocks as a JSON column
//!
//! Messages are append-only; ordering relies on `created_at` with the
//! integer rowid as a tiebreaker for same-millisecond inserts.

use async_trait::async_trait;
use chrono::Utc;
use colloquy_core::error::StoreError;
use colloquy_core::message::{Message, MessageContent, Role};
use colloquy_core::store::{MessageStore, ThreadStore};
use colloquy_core::thread::{AgentProfile, Thread, ThreadId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A production SQLite store for threads and messages.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables/indexes are created automatically.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS threads (
                id          TEXT PRIMARY KEY,
                title       TEXT,
                model       TEXT,
                agent       TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("threads table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                thread_id   TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("thread index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `Message` from a SQLite row.
    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let thread_id: String = row
            .try_get("thread_id")
            .map_err(|e| StoreError::QueryFailed(format!("thread_id column: {e}")))?;
        let role_str: String = row
            .try_get("role")
            .map_err(|e| StoreError::QueryFailed(format!("role column: {e}")))?;
        let content_json: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let role = role_from_str(&role_str)
            .ok_or_else(|| StoreError::QueryFailed(format!("unknown role: {role_str}")))?;

        let content: Vec<MessageContent> = serde_json::from_str(&content_json)
            .map_err(|e| StoreError::QueryFailed(format!("content blocks: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at: {e}")))?;

        Ok(Message {
            id,
            thread_id: ThreadId(thread_id),
            role,
            content,
            created_at,
        })
    }

    /// Parse a `Thread` from a SQLite row.
    fn row_to_thread(row: &sqlx::sqlite::SqliteRow) -> Result<Thread, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let title: Option<String> = row
            .try_get("title")
            .map_err(|e| StoreError::QueryFailed(format!("title column: {e}")))?;
        let model: Option<String> = row
            .try_get("model")
            .map_err(|e| StoreError::QueryFailed(format!("model column: {e}")))?;
        let agent_json: Option<String> = row
            .try_get("agent")
            .map_err(|e| StoreError::QueryFailed(format!("agent column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        let agent: Option<AgentProfile> = match agent_json {
            Some(json) => Some(
                serde_json::from_str(&json)
                    .map_err(|e| StoreError::QueryFailed(format!("agent profile: {e}")))?,
            ),
            None => None,
        };

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at: {e}")))?;
        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("updated_at: {e}")))?;

        Ok(Thread {
            id: ThreadId(id),
            title,
            model,
            agent,
            created_at,
            updated_at,
        })
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn role_from_str(s: &str) -> Option<Role> {
    match s {
        "system" => Some(Role::System),
        "user" => Some(Role::User),
        "assistant" => Some(Role::Assistant),
        "tool" => Some(Role::Tool),
        _ => None,
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn create(&self, message: Message) -> Result<Message, StoreError> {
        let content_json = serde_json::to_string(&message.content)
            .map_err(|e| StoreError::Storage(format!("serialize content: {e}")))?;

        sqlx::query(
            "INSERT INTO messages (id, thread_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.thread_id.0)
        .bind(role_to_str(message.role))
        .bind(&content_json)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("insert message: {e}")))?;

        Ok(message)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("select message: {e}")))?;

        row.as_ref().map(Self::row_to_message).transpose()
    }

    async fn find_many_by_thread_id(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE thread_id = ? ORDER BY created_at ASC, iid ASC",
        )
        .bind(&thread_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("select thread messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("delete message: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ThreadStore for SqliteStore {
    async fn create(&self, thread: Thread) -> Result<Thread, StoreError> {
        let agent_json = thread
            .agent
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Storage(format!("serialize agent profile: {e}")))?;

        sqlx::query(
            "INSERT INTO threads (id, title, model, agent, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&thread.id.0)
        .bind(&thread.title)
        .bind(&thread.model)
        .bind(&agent_json)
        .bind(thread.created_at.to_rfc3339())
        .bind(thread.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("insert thread: {e}")))?;

        Ok(thread)
    }

    async fn get(&self, id: &ThreadId) -> Result<Option<Thread>, StoreError> {
        let row = sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("select thread: {e}")))?;

        row.as_ref().map(Self::row_to_thread).transpose()
    }

    async fn delete(&self, id: &ThreadId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("delete thread: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::thread::AgentProfile;
    use serde_json::json;

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colloquy-test.db");
        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn message_roundtrip_preserves_blocks() {
        let (_dir, store) = store().await;
        let thread_id = ThreadId::from("t1");
        let msg = Message::assistant(
            thread_id.clone(),
            vec![
                MessageContent::thinking("planning"),
                MessageContent::text("Answer."),
                MessageContent::tool_use("call_1", "web_search", json!({"q": "rust"})),
                MessageContent::tool_result("call_1", "web_search", "ten results"),
            ],
        );

        MessageStore::create(&store, msg.clone()).await.unwrap();
        let found = store.find_by_id(&msg.id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Assistant);
        assert_eq!(found.content, msg.content);
    }

    #[tokio::test]
    async fn thread_history_ordering() {
        let (_dir, store) = store().await;
        let thread_id = ThreadId::from("t1");
        for i in 0..5 {
            let msg = Message::user(thread_id.clone(), format!("message {i}"));
            MessageStore::create(&store, msg).await.unwrap();
        }

        let history = store.find_many_by_thread_id(&thread_id).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].text(), "message 0");
        assert_eq!(history[4].text(), "message 4");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let (_dir, store) = store().await;
        let msg = Message::user(ThreadId::from("t1"), "bye");
        MessageStore::create(&store, msg.clone()).await.unwrap();

        assert!(MessageStore::delete(&store, &msg.id).await.unwrap());
        assert!(!MessageStore::delete(&store, &msg.id).await.unwrap());
    }

    #[tokio::test]
    async fn thread_with_agent_profile_roundtrips() {
        let (_dir, store) = store().await;
        let thread = Thread::new(Some("gpt-4o".into())).with_agent(AgentProfile {
            id: "agent_1".into(),
            name: "Researcher".into(),
            model: Some("claude-sonnet-4".into()),
            instructions: Some("Be thorough.".into()),
        });
        let id = thread.id.clone();
        ThreadStore::create(&store, thread).await.unwrap();

        let found = store.get(&id).await.unwrap().unwrap();
        assert_eq!(found.resolve_model(), Some("claude-sonnet-4"));
        assert_eq!(found.instructions(), Some("Be thorough."));
    }

    #[tokio::test]
    async fn missing_rows_are_none() {
        let (_dir, store) = store().await;
        assert!(store.find_by_id("nope").await.unwrap().is_none());
        assert!(store.get(&ThreadId::from("nope")).await.unwrap().is_none());
    }
}
