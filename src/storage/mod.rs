//! Conversation history storage
//!
//! SQLite-backed stand-in for the hosted row store: a single append-only
//! `messages` table keyed by user, ordered by creation time. Rows are never
//! updated or deleted; thread reconstruction happens purely on the read side.

use crate::chat::message::Role;
use crate::chat_mode::ChatMode;
use crate::error::{Result, TalviError};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection};
use std::path::PathBuf;

pub mod types;
pub use types::{HistoryItem, StoredMessage};

/// Storage backend for the message log
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Open the message log at its default location
    ///
    /// The database lives under the platform data directory; the
    /// `TALVI_HISTORY_DB` environment variable overrides the path when set.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("TALVI_HISTORY_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("ai", "talvi", "talvi")
            .ok_or_else(|| TalviError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| TalviError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("history.db"))
    }

    /// Open the message log at an explicit path
    ///
    /// Backs the `storage.path` config field and the CLI override; tests use
    /// it to keep each run inside its own temporary directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::storage::SqliteStorage;
    ///
    /// let storage = SqliteStorage::new_with_path("/tmp/test_talvi_history.db").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        // A missing parent directory would otherwise fail the first open.
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| TalviError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| TalviError::Storage(e.to_string()))?;
        Ok(conn)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                text TEXT NOT NULL,
                mode TEXT NOT NULL,
                sources TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| TalviError::Storage(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_user_created
                ON messages (user_id, created_at)",
            [],
        )
        .context("Failed to create index")
        .map_err(|e| TalviError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Append one message row to the log
    pub fn insert_message(&self, message: &StoredMessage) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO messages (id, user_id, role, text, mode, sources, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                message.id,
                message.user_id,
                message.role.to_string(),
                message.text,
                message.mode.to_string(),
                message.sources,
                message.created_at,
            ],
        )
        .context("Failed to insert message")
        .map_err(|e| TalviError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load the complete log for a user, oldest first
    ///
    /// This is the input shape the history reconstructor expects.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredMessage>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, role, text, mode, sources, created_at
                FROM messages
                WHERE user_id = ?
                ORDER BY created_at ASC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| TalviError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let role: String = row.get(2)?;
                let mode: String = row.get(4)?;
                Ok(StoredMessage {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    // Unknown tokens in old rows degrade gracefully rather
                    // than failing the whole read.
                    role: Role::parse_str(&role).unwrap_or(Role::User),
                    text: row.get(3)?,
                    mode: ChatMode::parse_lenient(&mode),
                    sources: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })
            .context("Failed to query messages")
            .map_err(|e| TalviError::Storage(e.to_string()))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(
                row.context("Failed to read message row")
                    .map_err(|e| TalviError::Storage(e.to_string()))?,
            );
        }

        Ok(messages)
    }

    /// List a user's recent turns for the history view, newest first
    ///
    /// Only user turns appear: history entries are indexed by user turns,
    /// and selecting one reconstructs the thread through its reply.
    pub fn history_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryItem>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, text, role, mode, created_at
                FROM messages
                WHERE user_id = ? AND role = 'user'
                ORDER BY created_at DESC
                LIMIT ?",
            )
            .context("Failed to prepare statement")
            .map_err(|e| TalviError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                let role: String = row.get(2)?;
                let mode: String = row.get(3)?;
                Ok(HistoryItem {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    role: Role::parse_str(&role).unwrap_or(Role::User),
                    mode: ChatMode::parse_lenient(&mode),
                    created_at: row.get(4)?,
                })
            })
            .context("Failed to query history")
            .map_err(|e| TalviError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(
                row.context("Failed to read history row")
                    .map_err(|e| TalviError::Storage(e.to_string()))?,
            );
        }

        Ok(items)
    }
}
