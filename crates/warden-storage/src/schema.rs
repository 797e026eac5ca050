//! Database schema and migrations.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StorageError};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 3;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(StorageError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    if current_version < SCHEMA_VERSION {
        info!(
            "Running migrations from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        if current_version < 1 {
            migrate_v1(conn)?;
        }

        if current_version < 2 {
            migrate_v2(conn)?;
        }

        if current_version < 3 {
            migrate_v3(conn)?;
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!("Migrations complete");
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration to version 1: forum tables the moderation core reads and
/// patches, plus the key-value config table.
fn migrate_v1(conn: &Connection) -> Result<()> {
    info!("Applying migration v1: Forum tables and config");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            status TEXT NOT NULL DEFAULT 'active',
            status_updated_at TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
        [],
    )?;

    // Authors are weak references: content may outlive its author row
    conn.execute(
        "CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Migration to version 2: reports.
fn migrate_v2(conn: &Connection) -> Result<()> {
    info!("Applying migration v2: Reports");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_type TEXT NOT NULL,
            content_id INTEGER NOT NULL,
            reporter_id INTEGER NOT NULL,
            reason TEXT NOT NULL,
            description TEXT NOT NULL,
            evidence TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            priority TEXT NOT NULL,
            assigned_to INTEGER,
            resolution_action TEXT,
            resolution_note TEXT,
            resolution_moderator_id INTEGER,
            resolved_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // At most one open report per (content, reporter); concurrent filings
    // race on this index instead of on a read-then-insert.
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_reports_open_per_reporter
         ON reports (content_type, content_id, reporter_id)
         WHERE status IN ('pending', 'in_review')",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports (created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reports_status ON reports (status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reports_reporter ON reports (reporter_id, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS reports_no_delete
         BEFORE DELETE ON reports
         BEGIN
             SELECT RAISE(ABORT, 'reports are never deleted');
         END",
        [],
    )?;

    Ok(())
}

/// Migration to version 3: moderation audit log and operator filters.
fn migrate_v3(conn: &Connection) -> Result<()> {
    info!("Applying migration v3: Moderation logs and content filters");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS moderation_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_type TEXT NOT NULL,
            content_id INTEGER NOT NULL,
            moderator_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            reason TEXT NOT NULL,
            report_id INTEGER REFERENCES reports(id),
            previous_content TEXT,
            automated INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_moderation_logs_created_at ON moderation_logs (created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_moderation_logs_report ON moderation_logs (report_id)",
        [],
    )?;

    // The audit trail is append-only
    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS moderation_logs_no_update
         BEFORE UPDATE ON moderation_logs
         BEGIN
             SELECT RAISE(ABORT, 'moderation logs are append-only');
         END",
        [],
    )?;

    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS moderation_logs_no_delete
         BEFORE DELETE ON moderation_logs
         BEGIN
             SELECT RAISE(ABORT, 'moderation logs are append-only');
         END",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS content_filters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filter_type TEXT NOT NULL,
            pattern TEXT NOT NULL,
            category TEXT NOT NULL,
            action TEXT NOT NULL DEFAULT 'flag',
            enabled INTEGER NOT NULL DEFAULT 1,
            created_by INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_content_filters_enabled ON content_filters (enabled)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();

        assert!(matches!(
            run_migrations(&conn),
            Err(StorageError::Migration(_))
        ));
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in [
            "users",
            "topics",
            "posts",
            "config",
            "reports",
            "moderation_logs",
            "content_filters",
        ] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "{table}");
        }
    }

    fn insert_report(conn: &Connection, reporter_id: i64, status: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO reports (content_type, content_id, reporter_id, reason, description,
                                  status, priority, created_at, updated_at)
             VALUES ('post', 1, ?1, 'spam', 'some description', ?2, 'low',
                     '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
            rusqlite::params![reporter_id, status],
        )
    }

    #[test]
    fn test_one_open_report_per_reporter() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        insert_report(&conn, 7, "pending").unwrap();
        assert!(insert_report(&conn, 7, "in_review").is_err());

        // Closed reports and other reporters are unaffected
        insert_report(&conn, 7, "resolved").unwrap();
        insert_report(&conn, 8, "pending").unwrap();
    }

    #[test]
    fn test_moderation_logs_are_append_only() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO moderation_logs (content_type, content_id, moderator_id, action, reason, created_at)
             VALUES ('post', 1, 2, 'no_action', 'ok', '2026-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();

        assert!(conn
            .execute("UPDATE moderation_logs SET reason = 'changed'", [])
            .is_err());
        assert!(conn.execute("DELETE FROM moderation_logs", []).is_err());
    }

    #[test]
    fn test_reports_are_never_deleted() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        insert_report(&conn, 1, "pending").unwrap();
        assert!(conn.execute("DELETE FROM reports", []).is_err());
    }
}
