//! Moderation log repository.
//!
//! Entries are append-only; the schema rejects updates and deletes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use warden_core::{ContentType, ModeratorAction};

use super::{format_timestamp, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{LogMetadata, ModerationLog, NewModerationLog};

const LOG_COLUMNS: &str = "id, content_type, content_id, moderator_id, action, reason,
     report_id, previous_content, automated, created_at";

/// Repository for the moderation audit trail.
pub struct LogsRepo;

impl LogsRepo {
    /// Append a log entry.
    pub fn insert(conn: &Connection, log: &NewModerationLog, now: DateTime<Utc>) -> Result<i64> {
        conn.execute(
            "INSERT INTO moderation_logs (content_type, content_id, moderator_id, action, reason,
                                          report_id, previous_content, automated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                log.content_type.as_str(),
                log.content_id,
                log.moderator_id,
                log.action.as_str(),
                log.reason,
                log.metadata.report_id,
                log.metadata.previous_content,
                log.metadata.automated_action,
                format_timestamp(now),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get the entries written for a report, oldest first.
    pub fn for_report(conn: &Connection, report_id: i64) -> Result<Vec<ModerationLog>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM moderation_logs WHERE report_id = ?1 ORDER BY id",
            LOG_COLUMNS
        ))?;

        let logs = stmt
            .query_map([report_id], map_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(logs)
    }

    /// Get the entries for a piece of content, oldest first.
    pub fn for_content(
        conn: &Connection,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<Vec<ModerationLog>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM moderation_logs WHERE content_type = ?1 AND content_id = ?2 ORDER BY id",
            LOG_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![content_type.as_str(), content_id], map_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(logs)
    }
}

fn map_log(row: &Row<'_>) -> rusqlite::Result<ModerationLog> {
    Ok(ModerationLog {
        id: row.get(0)?,
        content_type: parse_enum(1, row.get(1)?, ContentType::parse)?,
        content_id: row.get(2)?,
        moderator_id: row.get(3)?,
        action: parse_enum(4, row.get(4)?, ModeratorAction::parse)?,
        reason: row.get(5)?,
        metadata: LogMetadata {
            report_id: row.get(6)?,
            previous_content: row.get(7)?,
            automated_action: row.get(8)?,
        },
        created_at: parse_datetime(9, row.get(9)?)?,
    })
}
