//! Read-only moderation statistics.
//!
//! Every query takes an inclusive `[start, end]` window over the
//! `created_at` column of the table it reads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use warden_core::{ModeratorAction, ReportPriority, ReportReason, ReportStatus};

use super::{format_timestamp, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{ModeratorPerformance, ReportSummary, ResolutionTimes};

/// Repository for metrics queries.
pub struct MetricsRepo;

impl MetricsRepo {
    /// Count reports created in the window, by status, reason and priority.
    pub fn report_summary(
        conn: &Connection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ReportSummary> {
        let (start, end) = (format_timestamp(start), format_timestamp(end));

        let mut stmt = conn.prepare(
            "SELECT status, reason, priority, COUNT(*) FROM reports
             WHERE created_at >= ?1 AND created_at <= ?2
             GROUP BY status, reason, priority",
        )?;

        let rows = stmt
            .query_map(params![start, end], |row| {
                Ok((
                    parse_enum(0, row.get(0)?, ReportStatus::parse)?,
                    parse_enum(1, row.get(1)?, ReportReason::parse)?,
                    parse_enum(2, row.get(2)?, ReportPriority::parse)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut summary = ReportSummary::default();
        for (status, reason, priority, count) in rows {
            summary.total_reports += count;
            *summary.by_status.entry(status).or_insert(0) += count;
            *summary.by_reason.entry(reason).or_insert(0) += count;
            *summary.by_priority.entry(priority).or_insert(0) += count;
        }

        Ok(summary)
    }

    /// Filing-to-resolution times of resolved reports created in the window.
    pub fn resolution_times(
        conn: &Connection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ResolutionTimes> {
        let mut stmt = conn.prepare(
            "SELECT created_at, resolved_at FROM reports
             WHERE status = 'resolved' AND resolved_at IS NOT NULL
               AND created_at >= ?1 AND created_at <= ?2",
        )?;

        let durations = stmt
            .query_map(
                params![format_timestamp(start), format_timestamp(end)],
                |row| {
                    let created = parse_datetime(0, row.get(0)?)?;
                    let resolved = parse_datetime(1, row.get(1)?)?;
                    Ok((resolved - created).num_milliseconds())
                },
            )?
            .collect::<rusqlite::Result<Vec<i64>>>()?;

        if durations.is_empty() {
            return Ok(ResolutionTimes::default());
        }

        let total: i64 = durations.iter().sum();
        Ok(ResolutionTimes {
            resolved_count: durations.len() as i64,
            avg_ms: total as f64 / durations.len() as f64,
            min_ms: durations.iter().copied().min().unwrap_or(0),
            max_ms: durations.iter().copied().max().unwrap_or(0),
        })
    }

    /// Per-moderator action counts over log entries written in the window.
    pub fn moderator_performance(
        conn: &Connection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ModeratorPerformance>> {
        let mut stmt = conn.prepare(
            "SELECT l.moderator_id, u.name, u.email, l.action, COUNT(*)
             FROM moderation_logs l
             LEFT JOIN users u ON u.id = l.moderator_id
             WHERE l.created_at >= ?1 AND l.created_at <= ?2
             GROUP BY l.moderator_id, l.action
             ORDER BY l.moderator_id",
        )?;

        let rows = stmt
            .query_map(
                params![format_timestamp(start), format_timestamp(end)],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        parse_enum(3, row.get(3)?, ModeratorAction::parse)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut by_moderator: BTreeMap<i64, ModeratorPerformance> = BTreeMap::new();
        for (moderator_id, name, email, action, count) in rows {
            let entry = by_moderator
                .entry(moderator_id)
                .or_insert_with(|| ModeratorPerformance {
                    moderator_id,
                    moderator_name: name,
                    moderator_email: email,
                    actions: BTreeMap::new(),
                    total_actions: 0,
                });
            *entry.actions.entry(action).or_insert(0) += count;
            entry.total_actions += count;
        }

        Ok(by_moderator.into_values().collect())
    }
}
