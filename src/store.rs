use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::info;

use crate::message::{AttachmentKind, Message};

/// Result of offering a message to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The message id was new and the row was written.
    Inserted,
    /// A row with this id already exists; it was left untouched.
    Skipped,
}

/// SQLite archive of captured messages, shared across the whole process.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database at the given path and ensure the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // journal_mode PRAGMA always returns the resulting mode, so use query_row
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        Self::run_migrations(&conn)?;

        info!("Message store initialized at: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS messages (
                msg_id INTEGER PRIMARY KEY,
                global_name TEXT,
                message TEXT NOT NULL,
                msg_time TEXT NOT NULL,
                attach_id INTEGER NOT NULL,
                msg_type TEXT NOT NULL,
                img_url TEXT NOT NULL
            );
            ",
        )
        .context("Failed to create messages table")?;
        Ok(())
    }

    /// Insert a message if its id is not already present.
    ///
    /// A single INSERT OR IGNORE keeps the existence check and the write in
    /// one statement, so a retried or concurrent caller cannot race the
    /// dedup check. An existing row is never overwritten.
    pub async fn insert(&self, message: &Message) -> Result<InsertOutcome> {
        let conn = self.conn.lock().await;
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO messages
                 (msg_id, global_name, message, msg_time, attach_id, msg_type, img_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    message.id,
                    message.author_name,
                    message.content,
                    message.timestamp,
                    message.attachment_id,
                    message.attachment_kind.as_str(),
                    message.attachment_url,
                ],
            )
            .context("Failed to insert message")?;

        if rows == 0 {
            Ok(InsertOutcome::Skipped)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Load every stored message. No ordering is guaranteed.
    #[allow(dead_code)]
    pub async fn fetch_all(&self) -> Result<Vec<Message>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT msg_id, global_name, message, msg_time, attach_id, msg_type, img_url
                 FROM messages",
            )
            .context("Failed to prepare fetch_all query")?;

        let messages = stmt
            .query_map([], |row| {
                let tag: String = row.get(5)?;
                let kind = AttachmentKind::parse(&tag).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        format!("unknown msg_type tag: {tag}").into(),
                    )
                })?;
                let timestamp: DateTime<Utc> = row.get(3)?;

                Ok(Message {
                    id: row.get(0)?,
                    author_name: row.get(1)?,
                    content: row.get(2)?,
                    timestamp,
                    attachment_id: row.get(4)?,
                    attachment_kind: kind,
                    attachment_url: row.get(6)?,
                })
            })
            .context("Failed to map message rows")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to collect message rows")?;

        Ok(messages)
    }
}
