//! Topics and posts repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use warden_core::ContentType;

use super::{format_timestamp, parse_datetime};
use crate::error::Result;
use crate::models::ContentRecord;

/// Repository for the forum content the moderation core acts on.
pub struct ContentRepo;

impl ContentRepo {
    /// Insert a topic or post.
    pub fn insert(
        conn: &Connection,
        content_type: ContentType,
        author_id: i64,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        conn.execute(
            &format!(
                "INSERT INTO {} (author_id, body, created_at) VALUES (?1, ?2, ?3)",
                content_type.table()
            ),
            params![author_id, body, format_timestamp(created_at)],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a topic or post by ID.
    pub fn get(
        conn: &Connection,
        content_type: ContentType,
        id: i64,
    ) -> Result<Option<ContentRecord>> {
        let record = conn
            .query_row(
                &format!(
                    "SELECT id, author_id, body, created_at FROM {} WHERE id = ?1",
                    content_type.table()
                ),
                [id],
                |row| {
                    Ok(ContentRecord {
                        id: row.get(0)?,
                        content_type,
                        author_id: row.get(1)?,
                        body: row.get(2)?,
                        created_at: parse_datetime(3, row.get(3)?)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Delete a topic or post. Returns false if it did not exist.
    pub fn delete(conn: &Connection, content_type: ContentType, id: i64) -> Result<bool> {
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", content_type.table()),
            [id],
        )?;
        Ok(deleted > 0)
    }
}
