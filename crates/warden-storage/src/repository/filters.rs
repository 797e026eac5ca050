//! Content filters repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use warden_core::filter::{FilterAction, FilterCategory, FilterRule, FilterType};

use super::{format_timestamp, parse_datetime, parse_enum};
use crate::error::Result;
use crate::models::{ContentFilter, NewContentFilter};

const FILTER_COLUMNS: &str =
    "id, filter_type, pattern, category, action, enabled, created_by, created_at, updated_at";

/// Repository for operator-defined content filters.
pub struct FiltersRepo;

impl FiltersRepo {
    /// Insert a new filter.
    pub fn insert(conn: &Connection, filter: &NewContentFilter, now: DateTime<Utc>) -> Result<i64> {
        let now = format_timestamp(now);

        conn.execute(
            "INSERT INTO content_filters (filter_type, pattern, category, action, enabled,
                                          created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                filter.rule.filter_type.as_str(),
                filter.rule.pattern,
                filter.rule.category.as_str(),
                filter.rule.action.as_str(),
                filter.enabled,
                filter.created_by,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a filter by ID.
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<ContentFilter>> {
        let filter = conn
            .query_row(
                &format!("SELECT {} FROM content_filters WHERE id = ?1", FILTER_COLUMNS),
                [id],
                map_filter,
            )
            .optional()?;

        Ok(filter)
    }

    /// Get all filters.
    pub fn get_all(conn: &Connection) -> Result<Vec<ContentFilter>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM content_filters ORDER BY id",
            FILTER_COLUMNS
        ))?;

        let filters = stmt
            .query_map([], map_filter)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(filters)
    }

    /// Get enabled filters in evaluation order.
    pub fn get_enabled(conn: &Connection) -> Result<Vec<ContentFilter>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM content_filters WHERE enabled = 1 ORDER BY id",
            FILTER_COLUMNS
        ))?;

        let filters = stmt
            .query_map([], map_filter)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(filters)
    }

    /// Enable or disable a filter. Returns false if it does not exist.
    pub fn set_enabled(
        conn: &Connection,
        id: i64,
        enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let updated = conn.execute(
            "UPDATE content_filters SET enabled = ?1, updated_at = ?2 WHERE id = ?3",
            params![enabled, format_timestamp(now), id],
        )?;
        Ok(updated > 0)
    }
}

fn map_filter(row: &Row<'_>) -> rusqlite::Result<ContentFilter> {
    Ok(ContentFilter {
        id: row.get(0)?,
        rule: FilterRule {
            filter_type: parse_enum(1, row.get(1)?, FilterType::parse)?,
            pattern: row.get(2)?,
            category: parse_enum(3, row.get(3)?, FilterCategory::parse)?,
            action: parse_enum(4, row.get(4)?, FilterAction::parse)?,
        },
        enabled: row.get(5)?,
        created_by: row.get(6)?,
        created_at: parse_datetime(7, row.get(7)?)?,
        updated_at: parse_datetime(8, row.get(8)?)?,
    })
}
