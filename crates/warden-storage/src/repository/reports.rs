//! Reports repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use warden_core::{
    ContentType, ModeratorAction, ReportPriority, ReportReason, ReportStatus, ValidationError,
};

use super::{format_timestamp, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{NewReport, Report, ReportQuery, Resolution};

const REPORT_COLUMNS: &str = "id, content_type, content_id, reporter_id, reason, description,
     evidence, status, priority, assigned_to, resolution_action, resolution_note,
     resolution_moderator_id, resolved_at, created_at, updated_at";

/// Most urgent first, newest first within a priority, id as final tiebreak.
const QUEUE_ORDER: &str = " ORDER BY CASE priority
         WHEN 'urgent' THEN 3 WHEN 'high' THEN 2 WHEN 'medium' THEN 1 ELSE 0 END DESC,
     created_at DESC, id DESC";

/// Repository for report operations.
pub struct ReportsRepo;

impl ReportsRepo {
    /// Insert a new pending report.
    pub fn insert(
        conn: &Connection,
        report: &NewReport,
        priority: ReportPriority,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let now = format_timestamp(now);

        conn.execute(
            "INSERT INTO reports (content_type, content_id, reporter_id, reason, description,
                                  evidence, status, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                report.content_type.as_str(),
                report.content_id,
                report.reporter_id,
                report.reason.as_str(),
                report.description,
                report.evidence,
                ReportStatus::Pending.as_str(),
                priority.as_str(),
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a report by ID.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Report>> {
        let report = conn
            .query_row(
                &format!("SELECT {} FROM reports WHERE id = ?1", REPORT_COLUMNS),
                [id],
                map_report,
            )
            .optional()?;

        Ok(report)
    }

    /// Find the open report a user filed against a piece of content.
    pub fn find_open(
        conn: &Connection,
        content_type: ContentType,
        content_id: i64,
        reporter_id: i64,
    ) -> Result<Option<Report>> {
        let report = conn
            .query_row(
                &format!(
                    "SELECT {} FROM reports
                     WHERE content_type = ?1 AND content_id = ?2 AND reporter_id = ?3
                       AND status IN ('pending', 'in_review')",
                    REPORT_COLUMNS
                ),
                params![content_type.as_str(), content_id, reporter_id],
                map_report,
            )
            .optional()?;

        Ok(report)
    }

    /// Count open reports against a piece of content.
    pub fn count_open_for_content(
        conn: &Connection,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM reports
             WHERE content_type = ?1 AND content_id = ?2 AND status IN ('pending', 'in_review')",
            params![content_type.as_str(), content_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count reports a user filed at or after `since`.
    pub fn count_filed_since(
        conn: &Connection,
        reporter_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM reports WHERE reporter_id = ?1 AND created_at >= ?2",
            params![reporter_id, format_timestamp(since)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get one page of reports in queue order.
    pub fn list(conn: &Connection, query: &ReportQuery) -> Result<Vec<Report>> {
        let mut sql = format!("SELECT {} FROM reports WHERE 1=1", REPORT_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        push_filters(&mut sql, &mut params_vec, query);

        sql.push_str(QUEUE_ORDER);
        sql.push_str(" LIMIT ? OFFSET ?");
        params_vec.push(Box::new(query.limit));
        params_vec.push(Box::new(query.offset().ok_or_else(|| {
            ValidationError::InvalidValue {
                field: "page",
                value: query.page.to_string(),
            }
        })?));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let reports = stmt
            .query_map(params_refs.as_slice(), map_report)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(reports)
    }

    /// Count reports matching the query's filters.
    pub fn count(conn: &Connection, query: &ReportQuery) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM reports WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        push_filters(&mut sql, &mut params_vec, query);

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let count = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;

        Ok(count)
    }

    /// Move an open report to `in_review` under a moderator.
    pub fn mark_in_review(
        conn: &Connection,
        id: i64,
        moderator_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let updated = conn.execute(
            "UPDATE reports SET status = ?1, assigned_to = ?2, updated_at = ?3
             WHERE id = ?4 AND status IN ('pending', 'in_review')",
            params![
                ReportStatus::InReview.as_str(),
                moderator_id,
                format_timestamp(now),
                id
            ],
        )?;
        Ok(updated > 0)
    }

    /// Close an open report with a resolution. Returns false if the report
    /// was not open.
    pub fn close(
        conn: &Connection,
        id: i64,
        status: ReportStatus,
        resolution: &Resolution,
    ) -> Result<bool> {
        let at = format_timestamp(resolution.timestamp);
        let updated = conn.execute(
            "UPDATE reports
             SET status = ?1, resolution_action = ?2, resolution_note = ?3,
                 resolution_moderator_id = ?4, resolved_at = ?5, updated_at = ?5
             WHERE id = ?6 AND status IN ('pending', 'in_review')",
            params![
                status.as_str(),
                resolution.action.as_str(),
                resolution.note,
                resolution.moderator_id,
                at,
                id
            ],
        )?;
        Ok(updated > 0)
    }
}

fn push_filters(
    sql: &mut String,
    params_vec: &mut Vec<Box<dyn rusqlite::ToSql>>,
    query: &ReportQuery,
) {
    if let Some(status) = query.status {
        sql.push_str(" AND status = ?");
        params_vec.push(Box::new(status.as_str()));
    }

    if let Some(priority) = query.priority {
        sql.push_str(" AND priority = ?");
        params_vec.push(Box::new(priority.as_str()));
    }
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<Report> {
    let resolution = match (
        row.get::<_, Option<String>>(10)?,
        row.get::<_, Option<i64>>(12)?,
        row.get::<_, Option<String>>(13)?,
    ) {
        (Some(action), Some(moderator_id), Some(at)) => Some(Resolution {
            action: parse_enum(10, action, ModeratorAction::parse)?,
            note: row.get(11)?,
            moderator_id,
            timestamp: parse_datetime(13, at)?,
        }),
        _ => None,
    };

    Ok(Report {
        id: row.get(0)?,
        content_type: parse_enum(1, row.get(1)?, ContentType::parse)?,
        content_id: row.get(2)?,
        reporter_id: row.get(3)?,
        reason: parse_enum(4, row.get(4)?, ReportReason::parse)?,
        description: row.get(5)?,
        evidence: row.get(6)?,
        status: parse_enum(7, row.get(7)?, ReportStatus::parse)?,
        priority: parse_enum(8, row.get(8)?, ReportPriority::parse)?,
        assigned_to: row.get(9)?,
        resolution,
        created_at: parse_datetime(14, row.get(14)?)?,
        updated_at: parse_datetime(15, row.get(15)?)?,
    })
}
