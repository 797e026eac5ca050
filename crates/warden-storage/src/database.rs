//! High-level database interface.
//!
//! [`Database`] owns the connection pool and implements the moderation
//! operations on top of the repositories. Every operation holds the pool
//! lock for its whole duration; the multi-record ones (resolve, reject,
//! automated enforcement) also run inside one SQLite transaction.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;
use tracing::{debug, info};
use warden_core::config::{AutomatedAction, CONFIG_KEY, SYSTEM_MODERATOR_ID};
use warden_core::filter::ScanResult;
use warden_core::report::validate_description;
use warden_core::{
    ActionEffect, ContentType, ModerationConfig, ModeratorAction, ReportStatus, ValidationError,
};

use crate::error::{Result, StorageError};
use crate::models::{
    ContentFilter, ContentRecord, EnforcementOutcome, LogMetadata, ModerationLog,
    ModerationMetrics, NewContentFilter, NewModerationLog, NewReport, NewUser, Report, ReportPage,
    ReportQuery, Resolution, User, MAX_PAGE_SIZE,
};
use crate::pool::ConnectionPool;
use crate::repository::{
    ConfigRepo, ContentRepo, FiltersRepo, LogsRepo, MetricsRepo, ReportsRepo, UsersRepo,
};

/// High-level database interface for Warden.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new database in the default app data directory.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_db_path()?)
    }

    /// Create a new database at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory()?;
        Ok(Self { pool })
    }

    /// Get the default database path.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "warden", "warden")
            .ok_or_else(|| StorageError::Config("Could not determine app data directory".into()))?;

        Ok(proj_dirs.data_dir().join("warden.db"))
    }

    // === Reports ===

    /// File a report against a topic or post.
    pub fn file_report(&self, report: NewReport) -> Result<Report> {
        self.file_report_at(report, Utc::now())
    }

    fn file_report_at(&self, report: NewReport, now: DateTime<Utc>) -> Result<Report> {
        validate_description(&report.description)?;

        let conn = self.pool.get()?;

        if ReportsRepo::find_open(
            &conn,
            report.content_type,
            report.content_id,
            report.reporter_id,
        )?
        .is_some()
        {
            return Err(duplicate(&report));
        }

        let content = ContentRepo::get(&conn, report.content_type, report.content_id)?.ok_or(
            StorageError::ContentNotFound {
                content_type: report.content_type,
                content_id: report.content_id,
            },
        )?;

        let config = Self::moderation_config_on(&conn)?;
        let limits = &config.limits;

        let filed = ReportsRepo::count_filed_since(&conn, report.reporter_id, now - Duration::hours(24))?;
        if filed >= i64::from(limits.max_reports_per_user_per_day) {
            return Err(StorageError::ReportLimitExceeded(format!(
                "user {} has filed {} reports in the last 24 hours",
                report.reporter_id, filed
            )));
        }

        let open =
            ReportsRepo::count_open_for_content(&conn, report.content_type, report.content_id)?;
        if open >= i64::from(limits.max_open_reports_per_content) {
            return Err(StorageError::ReportLimitExceeded(format!(
                "{} {} already has {} open reports",
                report.content_type.as_str(),
                report.content_id,
                open
            )));
        }

        let priority = config
            .priority
            .compute(report.reason, content.created_at, now);

        // A concurrent filing may have won the race since the lookup above
        let id = ReportsRepo::insert(&conn, &report, priority, now).map_err(|e| {
            if e.is_constraint_violation() {
                duplicate(&report)
            } else {
                e
            }
        })?;

        info!(
            report_id = id,
            content_type = report.content_type.as_str(),
            content_id = report.content_id,
            reason = report.reason.as_str(),
            priority = priority.as_str(),
            "Report filed"
        );

        ReportsRepo::get_by_id(&conn, id)?.ok_or(StorageError::ReportNotFound(id))
    }

    /// Get one page of the moderator queue.
    pub fn list_reports(&self, query: &ReportQuery) -> Result<ReportPage> {
        if query.page < 1 || query.offset().is_none() {
            return Err(ValidationError::InvalidValue {
                field: "page",
                value: query.page.to_string(),
            }
            .into());
        }
        if query.limit < 1 || query.limit > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidValue {
                field: "limit",
                value: query.limit.to_string(),
            }
            .into());
        }

        let conn = self.pool.get()?;
        let reports = ReportsRepo::list(&conn, query)?;
        let total = ReportsRepo::count(&conn, query)?;

        Ok(ReportPage {
            reports,
            total,
            page: query.page,
            total_pages: (total + query.limit - 1) / query.limit,
        })
    }

    /// Get a report by ID.
    pub fn get_report(&self, id: i64) -> Result<Report> {
        let conn = self.pool.get()?;
        ReportsRepo::get_by_id(&conn, id)?.ok_or(StorageError::ReportNotFound(id))
    }

    /// Get the audit entries written for a report.
    pub fn report_logs(&self, report_id: i64) -> Result<Vec<ModerationLog>> {
        let conn = self.pool.get()?;
        LogsRepo::for_report(&conn, report_id)
    }

    /// Get the audit entries for a piece of content.
    pub fn content_logs(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<Vec<ModerationLog>> {
        let conn = self.pool.get()?;
        LogsRepo::for_content(&conn, content_type, content_id)
    }

    /// Take an open report into review.
    pub fn claim_report(&self, report_id: i64, moderator_id: i64) -> Result<Report> {
        let conn = self.pool.get()?;

        let report = open_report(&conn, report_id)?;
        ReportsRepo::mark_in_review(&conn, report.id, moderator_id, Utc::now())?;

        info!(report_id, moderator_id, "Report claimed");

        ReportsRepo::get_by_id(&conn, report_id)?.ok_or(StorageError::ReportNotFound(report_id))
    }

    // === Moderation actions ===

    /// Resolve a report with a moderator action and apply its effect.
    ///
    /// The status change, audit entry and side effect commit together or
    /// not at all.
    pub fn resolve_report(
        &self,
        report_id: i64,
        moderator_id: i64,
        action: ModeratorAction,
        note: Option<String>,
    ) -> Result<Report> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        let report = conn.transaction(|tx| {
            let report = open_report(tx, report_id)?;

            let resolution = Resolution {
                action,
                note: note.clone(),
                moderator_id,
                timestamp: now,
            };
            ReportsRepo::close(tx, report_id, ReportStatus::Resolved, &resolution)?;

            let content = ContentRepo::get(tx, report.content_type, report.content_id)?;
            let previous_content = match action.effect() {
                ActionEffect::DeleteContent => content.as_ref().map(|c| c.body.clone()),
                _ => None,
            };

            LogsRepo::insert(
                tx,
                &NewModerationLog {
                    content_type: report.content_type,
                    content_id: report.content_id,
                    moderator_id,
                    action,
                    reason: note
                        .clone()
                        .unwrap_or_else(|| report.reason.as_str().to_string()),
                    metadata: LogMetadata {
                        report_id: Some(report_id),
                        previous_content,
                        automated_action: false,
                    },
                },
                now,
            )?;

            apply_effect(tx, action, content.as_ref(), now)?;

            ReportsRepo::get_by_id(tx, report_id)?.ok_or(StorageError::ReportNotFound(report_id))
        })?;

        info!(
            report_id,
            moderator_id,
            action = action.as_str(),
            "Report resolved"
        );

        Ok(report)
    }

    /// Reject a report without acting on the content.
    pub fn reject_report(
        &self,
        report_id: i64,
        moderator_id: i64,
        note: Option<String>,
    ) -> Result<Report> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        let report = conn.transaction(|tx| {
            let report = open_report(tx, report_id)?;

            let resolution = Resolution {
                action: ModeratorAction::NoAction,
                note: note.clone(),
                moderator_id,
                timestamp: now,
            };
            ReportsRepo::close(tx, report_id, ReportStatus::Rejected, &resolution)?;

            LogsRepo::insert(
                tx,
                &NewModerationLog {
                    content_type: report.content_type,
                    content_id: report.content_id,
                    moderator_id,
                    action: ModeratorAction::NoAction,
                    reason: note
                        .clone()
                        .unwrap_or_else(|| format!("report rejected: {}", report.reason.as_str())),
                    metadata: LogMetadata {
                        report_id: Some(report_id),
                        ..Default::default()
                    },
                },
                now,
            )?;

            ReportsRepo::get_by_id(tx, report_id)?.ok_or(StorageError::ReportNotFound(report_id))
        })?;

        info!(report_id, moderator_id, "Report rejected");

        Ok(report)
    }

    // === Filtering ===

    /// Evaluate text against the built-in rules and enabled filters.
    pub fn scan_content(&self, content: &str, content_type: ContentType) -> Result<ScanResult> {
        let conn = self.pool.get()?;
        let result = scan(&conn, content)?;

        debug!(
            content_type = content_type.as_str(),
            allowed = result.allowed,
            flags = result.flags.len(),
            "Content scanned"
        );

        Ok(result)
    }

    /// Scan stored content and apply the automated action when a blocking
    /// filter matches.
    pub fn enforce_filters(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<EnforcementOutcome> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        conn.transaction(|tx| {
            let content = ContentRepo::get(tx, content_type, content_id)?.ok_or(
                StorageError::ContentNotFound {
                    content_type,
                    content_id,
                },
            )?;

            let config = Self::moderation_config_on(tx)?;
            let result = scan(tx, &content.body)?;

            let Some(category) = result.blocked_by else {
                return Ok(EnforcementOutcome {
                    scan: result,
                    action: None,
                    log_id: None,
                });
            };

            let action = config.automated.for_category(category);
            let log = match action {
                AutomatedAction::DeleteContent => NewModerationLog {
                    content_type,
                    content_id,
                    moderator_id: SYSTEM_MODERATOR_ID,
                    action: ModeratorAction::DeleteContent,
                    reason: format!("automated filter: {}", category.as_str()),
                    metadata: LogMetadata {
                        report_id: None,
                        previous_content: Some(content.body.clone()),
                        automated_action: true,
                    },
                },
                AutomatedAction::FlagForReview => NewModerationLog {
                    content_type,
                    content_id,
                    moderator_id: SYSTEM_MODERATOR_ID,
                    action: ModeratorAction::NoAction,
                    reason: format!("flagged for review: {}", category.as_str()),
                    metadata: LogMetadata {
                        automated_action: true,
                        ..Default::default()
                    },
                },
            };

            let log_id = LogsRepo::insert(tx, &log, now)?;
            if action == AutomatedAction::DeleteContent {
                ContentRepo::delete(tx, content_type, content_id)?;
            }

            info!(
                content_type = content_type.as_str(),
                content_id,
                category = category.as_str(),
                action = ?action,
                "Automated filter action applied"
            );

            Ok(EnforcementOutcome {
                scan: result,
                action: Some(action),
                log_id: Some(log_id),
            })
        })
    }

    /// Create an operator filter.
    pub fn create_filter(&self, filter: NewContentFilter) -> Result<ContentFilter> {
        filter.rule.validate()?;

        let conn = self.pool.get()?;
        let id = FiltersRepo::insert(&conn, &filter, Utc::now())?;

        info!(
            filter_id = id,
            filter_type = filter.rule.filter_type.as_str(),
            category = filter.rule.category.as_str(),
            "Content filter created"
        );

        FiltersRepo::get_by_id(&conn, id)?
            .ok_or_else(|| StorageError::NotFound(format!("content filter {}", id)))
    }

    /// Get all operator filters.
    pub fn get_filters(&self) -> Result<Vec<ContentFilter>> {
        let conn = self.pool.get()?;
        FiltersRepo::get_all(&conn)
    }

    /// Enable or disable an operator filter.
    pub fn set_filter_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        let conn = self.pool.get()?;
        if !FiltersRepo::set_enabled(&conn, id, enabled, Utc::now())? {
            return Err(StorageError::NotFound(format!("content filter {}", id)));
        }
        Ok(())
    }

    // === Metrics ===

    /// Summarize moderation activity in the inclusive window `[start, end]`.
    pub fn summarize(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<ModerationMetrics> {
        if start > end {
            return Err(ValidationError::InvalidRange.into());
        }

        let conn = self.pool.get()?;

        Ok(ModerationMetrics {
            start,
            end,
            summary: MetricsRepo::report_summary(&conn, start, end)?,
            resolution_times: MetricsRepo::resolution_times(&conn, start, end)?,
            moderator_performance: MetricsRepo::moderator_performance(&conn, start, end)?,
        })
    }

    // === Forum records ===

    /// Create a forum user.
    pub fn create_user(&self, user: NewUser) -> Result<i64> {
        let conn = self.pool.get()?;
        UsersRepo::insert(&conn, &user)
    }

    /// Get a forum user by ID.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        UsersRepo::get_by_id(&conn, id)
    }

    /// Create a topic or post.
    pub fn create_content(
        &self,
        content_type: ContentType,
        author_id: i64,
        body: &str,
    ) -> Result<i64> {
        let conn = self.pool.get()?;
        ContentRepo::insert(&conn, content_type, author_id, body, Utc::now())
    }

    /// Get a topic or post.
    pub fn get_content(&self, content_type: ContentType, id: i64) -> Result<Option<ContentRecord>> {
        let conn = self.pool.get()?;
        ContentRepo::get(&conn, content_type, id)
    }

    // === Config ===

    /// Set a configuration value.
    pub fn set_config(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.pool.get()?;
        ConfigRepo::set(&conn, key, value)
    }

    /// Get the moderation policy, or the defaults if none is stored.
    pub fn moderation_config(&self) -> Result<ModerationConfig> {
        let conn = self.pool.get()?;
        Self::moderation_config_on(&conn)
    }

    /// Store the moderation policy.
    pub fn set_moderation_config(&self, config: &ModerationConfig) -> Result<()> {
        config.validate()?;
        let value = serde_json::to_value(config)?;
        self.set_config(CONFIG_KEY, &value)
    }

    fn moderation_config_on(conn: &Connection) -> Result<ModerationConfig> {
        let config = ConfigRepo::get_or_default(conn, CONFIG_KEY, ModerationConfig::default())?;
        config.validate().map_err(|e| {
            StorageError::Config(format!("stored moderation config is invalid: {}", e))
        })?;
        Ok(config)
    }
}

fn open_report(conn: &Connection, report_id: i64) -> Result<Report> {
    let report =
        ReportsRepo::get_by_id(conn, report_id)?.ok_or(StorageError::ReportNotFound(report_id))?;

    if !report.status.is_open() {
        return Err(StorageError::AlreadyResolved {
            id: report_id,
            status: report.status,
        });
    }

    Ok(report)
}

fn apply_effect(
    conn: &Connection,
    action: ModeratorAction,
    content: Option<&ContentRecord>,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(content) = content else {
        debug!(action = action.as_str(), "Reported content is gone; nothing to apply");
        return Ok(());
    };

    match action.effect() {
        ActionEffect::None => {}
        ActionEffect::DeleteContent => {
            ContentRepo::delete(conn, content.content_type, content.id)?;
        }
        ActionEffect::SetAuthorStatus(status) => {
            if !UsersRepo::set_status(conn, content.author_id, status, now)? {
                debug!(author_id = content.author_id, "Content author is gone; status unchanged");
            }
        }
    }

    Ok(())
}

fn scan(conn: &Connection, content: &str) -> Result<ScanResult> {
    let config = Database::moderation_config_on(conn)?;
    let filters = FiltersRepo::get_enabled(conn)?;

    Ok(config
        .filter_engine()
        .evaluate(content, filters.iter().map(|f| &f.rule)))
}

fn duplicate(report: &NewReport) -> StorageError {
    StorageError::DuplicateReport {
        content_type: report.content_type,
        content_id: report.content_id,
        reporter_id: report.reporter_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::filter::{FilterAction, FilterCategory, FilterRule};
    use warden_core::{AccountStatus, ReportPriority, ReportReason, UserRole};

    struct Forum {
        db: Database,
        author: i64,
        reporter: i64,
        moderator: i64,
        post: i64,
    }

    fn forum() -> Forum {
        let db = Database::in_memory().unwrap();

        let author = db.create_user(new_user("author", UserRole::User)).unwrap();
        let reporter = db.create_user(new_user("reporter", UserRole::User)).unwrap();
        let moderator = db.create_user(new_user("mod", UserRole::Moderator)).unwrap();
        let post = db
            .create_content(ContentType::Post, author, "some questionable post body")
            .unwrap();

        Forum {
            db,
            author,
            reporter,
            moderator,
            post,
        }
    }

    fn new_user(name: &str, role: UserRole) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: Some(format!("{}@example.com", name)),
            role,
        }
    }

    fn new_report(content_id: i64, reporter_id: i64, reason: ReportReason) -> NewReport {
        NewReport {
            content_type: ContentType::Post,
            content_id,
            reporter_id,
            reason,
            description: "this breaks the forum rules".to_string(),
            evidence: None,
        }
    }

    #[test]
    fn test_file_report() {
        let f = forum();

        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Harassment))
            .unwrap();

        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.priority, ReportPriority::Urgent);
        assert_eq!(report.reporter_id, f.reporter);
        assert!(report.resolution.is_none());
        assert_eq!(f.db.get_report(report.id).unwrap(), report);
    }

    #[test]
    fn test_priority_uses_content_age() {
        let f = forum();
        let old_post = {
            let conn = f.db.pool.get().unwrap();
            ContentRepo::insert(
                &conn,
                ContentType::Post,
                f.author,
                "an old post body",
                Utc::now() - Duration::hours(48),
            )
            .unwrap()
        };

        let fresh = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();
        let stale = f
            .db
            .file_report(new_report(old_post, f.reporter, ReportReason::Spam))
            .unwrap();

        assert_eq!(fresh.priority, ReportPriority::Medium);
        assert_eq!(stale.priority, ReportPriority::Low);
    }

    #[test]
    fn test_file_report_validation() {
        let f = forum();

        let mut short = new_report(f.post, f.reporter, ReportReason::Spam);
        short.description = "too short".to_string();
        assert!(matches!(
            f.db.file_report(short),
            Err(StorageError::Validation(ValidationError::TooShort { .. }))
        ));

        let mut long = new_report(f.post, f.reporter, ReportReason::Spam);
        long.description = "x".repeat(1001);
        assert!(matches!(
            f.db.file_report(long),
            Err(StorageError::Validation(ValidationError::TooLong { .. }))
        ));

        let missing = new_report(f.post + 100, f.reporter, ReportReason::Spam);
        assert!(matches!(
            f.db.file_report(missing),
            Err(StorageError::ContentNotFound { .. })
        ));

        assert_eq!(f.db.list_reports(&ReportQuery::default()).unwrap().total, 0);
    }

    #[test]
    fn test_duplicate_open_report() {
        let f = forum();

        let first = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();
        assert!(matches!(
            f.db.file_report(new_report(f.post, f.reporter, ReportReason::Other)),
            Err(StorageError::DuplicateReport { .. })
        ));

        // Same id on a topic is different content
        let topic = f
            .db
            .create_content(ContentType::Topic, f.author, "a topic body here")
            .unwrap();
        let mut on_topic = new_report(topic, f.reporter, ReportReason::Spam);
        on_topic.content_type = ContentType::Topic;
        f.db.file_report(on_topic).unwrap();

        // Closing the first report allows a new one
        f.db.reject_report(first.id, f.moderator, None).unwrap();
        f.db.file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();
    }

    #[test]
    fn test_lost_filing_race_is_duplicate() {
        let f = forum();

        // Another writer files the same report between the open-report lookup
        // and our insert
        f.db.pool
            .get()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER concurrent_filing BEFORE INSERT ON reports
                 WHEN NEW.description <> 'filed concurrently'
                 BEGIN
                     INSERT INTO reports (content_type, content_id, reporter_id, reason,
                                          description, status, priority, created_at, updated_at)
                     VALUES (NEW.content_type, NEW.content_id, NEW.reporter_id, 'other',
                             'filed concurrently', 'pending', 'low',
                             NEW.created_at, NEW.created_at);
                 END",
            )
            .unwrap();

        let err = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::DuplicateReport { content_id, reporter_id, .. }
                if content_id == f.post && reporter_id == f.reporter
        ));
    }

    #[test]
    fn test_report_limits() {
        let f = forum();
        let mut config = ModerationConfig::default();
        config.limits.max_reports_per_user_per_day = 2;
        config.limits.max_open_reports_per_content = 2;
        f.db.set_moderation_config(&config).unwrap();

        let posts: Vec<i64> = (0..3)
            .map(|i| {
                f.db.create_content(ContentType::Post, f.author, &format!("post number {}", i))
                    .unwrap()
            })
            .collect();

        f.db.file_report(new_report(posts[0], f.reporter, ReportReason::Spam))
            .unwrap();
        f.db.file_report(new_report(posts[1], f.reporter, ReportReason::Spam))
            .unwrap();
        assert!(matches!(
            f.db.file_report(new_report(posts[2], f.reporter, ReportReason::Spam)),
            Err(StorageError::ReportLimitExceeded(_))
        ));

        // Reports older than a day no longer count
        let old = Utc::now() - Duration::hours(25);
        let other = f.db.create_user(new_user("other", UserRole::User)).unwrap();
        let third = f.db.create_user(new_user("third", UserRole::User)).unwrap();
        f.db.file_report_at(new_report(posts[2], other, ReportReason::Spam), old)
            .unwrap();
        f.db.file_report(new_report(posts[1], other, ReportReason::Spam))
            .unwrap();

        // posts[2] now has one open report; posts[1] has two
        assert!(matches!(
            f.db.file_report(new_report(posts[1], third, ReportReason::Spam)),
            Err(StorageError::ReportLimitExceeded(_))
        ));
        f.db.file_report(new_report(posts[2], third, ReportReason::Spam))
            .unwrap();
    }

    #[test]
    fn test_list_reports_order_and_paging() {
        let f = forum();
        let reporters: Vec<i64> = (0..3)
            .map(|i| {
                f.db.create_user(new_user(&format!("r{}", i), UserRole::User))
                    .unwrap()
            })
            .collect();

        let other = f
            .db
            .file_report(new_report(f.post, reporters[0], ReportReason::Other))
            .unwrap();
        let hate = f
            .db
            .file_report(new_report(f.post, reporters[1], ReportReason::HateSpeech))
            .unwrap();
        let adult = f
            .db
            .file_report(new_report(f.post, reporters[2], ReportReason::AdultContent))
            .unwrap();

        let page = f.db.list_reports(&ReportQuery::default()).unwrap();
        let ids: Vec<i64> = page.reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![hate.id, adult.id, other.id]);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);

        let second = f
            .db
            .list_reports(&ReportQuery {
                page: 2,
                limit: 2,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(second.reports.len(), 1);
        assert_eq!(second.reports[0].id, other.id);
        assert_eq!(second.total_pages, 2);

        let bad_page = ReportQuery {
            page: 0,
            ..Default::default()
        };
        assert!(matches!(
            f.db.list_reports(&bad_page),
            Err(StorageError::Validation(_))
        ));

        let bad_limit = ReportQuery {
            limit: MAX_PAGE_SIZE + 1,
            ..Default::default()
        };
        assert!(f.db.list_reports(&bad_limit).is_err());

        let far_page = ReportQuery {
            page: i64::MAX,
            limit: MAX_PAGE_SIZE,
            ..Default::default()
        };
        assert!(matches!(
            f.db.list_reports(&far_page),
            Err(StorageError::Validation(ValidationError::InvalidValue { field: "page", .. }))
        ));
        assert_eq!(f.db.list_reports(&ReportQuery::default()).unwrap().total, 3);
    }

    #[test]
    fn test_claim_report() {
        let f = forum();
        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();

        let claimed = f.db.claim_report(report.id, f.moderator).unwrap();
        assert_eq!(claimed.status, ReportStatus::InReview);
        assert_eq!(claimed.assigned_to, Some(f.moderator));

        // Still open, so it blocks duplicates and can be resolved
        assert!(matches!(
            f.db.file_report(new_report(f.post, f.reporter, ReportReason::Spam)),
            Err(StorageError::DuplicateReport { .. })
        ));
        f.db.resolve_report(report.id, f.moderator, ModeratorAction::NoAction, None)
            .unwrap();

        assert!(matches!(
            f.db.claim_report(report.id, f.moderator),
            Err(StorageError::AlreadyResolved { .. })
        ));
        assert!(matches!(
            f.db.claim_report(report.id + 1, f.moderator),
            Err(StorageError::ReportNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_delete_content() {
        let f = forum();
        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();

        let resolved = f
            .db
            .resolve_report(
                report.id,
                f.moderator,
                ModeratorAction::DeleteContent,
                Some("obvious spam".to_string()),
            )
            .unwrap();

        assert_eq!(resolved.status, ReportStatus::Resolved);
        let resolution = resolved.resolution.unwrap();
        assert_eq!(resolution.action, ModeratorAction::DeleteContent);
        assert_eq!(resolution.moderator_id, f.moderator);
        assert_eq!(resolution.note.as_deref(), Some("obvious spam"));

        assert!(f.db.get_content(ContentType::Post, f.post).unwrap().is_none());

        let logs = f.db.report_logs(report.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, ModeratorAction::DeleteContent);
        assert_eq!(logs[0].reason, "obvious spam");
        assert_eq!(logs[0].moderator_id, f.moderator);
        assert!(!logs[0].metadata.automated_action);
        assert_eq!(
            logs[0].metadata.previous_content.as_deref(),
            Some("some questionable post body")
        );
    }

    #[test]
    fn test_resolve_sets_author_status() {
        let f = forum();

        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Harassment))
            .unwrap();
        f.db.resolve_report(report.id, f.moderator, ModeratorAction::SuspendUser, None)
            .unwrap();

        let author = f.db.get_user(f.author).unwrap().unwrap();
        assert_eq!(author.status, AccountStatus::Suspended);
        assert!(author.status_updated_at.is_some());

        // Log reason falls back to the report reason
        let logs = f.db.report_logs(report.id).unwrap();
        assert_eq!(logs[0].reason, "harassment");

        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Harassment))
            .unwrap();
        f.db.resolve_report(report.id, f.moderator, ModeratorAction::BanUser, None)
            .unwrap();

        let author = f.db.get_user(f.author).unwrap().unwrap();
        assert_eq!(author.status, AccountStatus::Banned);
    }

    #[test]
    fn test_non_destructive_actions() {
        let f = forum();

        for (i, action) in [
            ModeratorAction::NoAction,
            ModeratorAction::EditContent,
            ModeratorAction::WarnUser,
        ]
        .into_iter()
        .enumerate()
        {
            let reporter = f
                .db
                .create_user(new_user(&format!("reporter{}", i), UserRole::User))
                .unwrap();
            let report = f
                .db
                .file_report(new_report(f.post, reporter, ReportReason::Other))
                .unwrap();
            f.db.resolve_report(report.id, f.moderator, action, None)
                .unwrap();
        }

        assert!(f.db.get_content(ContentType::Post, f.post).unwrap().is_some());
        let author = f.db.get_user(f.author).unwrap().unwrap();
        assert_eq!(author.status, AccountStatus::Active);
        assert_eq!(
            f.db.content_logs(ContentType::Post, f.post).unwrap().len(),
            3
        );
    }

    #[test]
    fn test_ban_after_content_is_gone() {
        let f = forum();
        let first = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();
        let other = f.db.create_user(new_user("other", UserRole::User)).unwrap();
        let second = f
            .db
            .file_report(new_report(f.post, other, ReportReason::Spam))
            .unwrap();

        f.db.resolve_report(first.id, f.moderator, ModeratorAction::DeleteContent, None)
            .unwrap();
        let resolved = f
            .db
            .resolve_report(second.id, f.moderator, ModeratorAction::BanUser, None)
            .unwrap();

        assert_eq!(resolved.status, ReportStatus::Resolved);
        let author = f.db.get_user(f.author).unwrap().unwrap();
        assert_eq!(author.status, AccountStatus::Active);
        assert_eq!(f.db.report_logs(second.id).unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_twice_fails() {
        let f = forum();
        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();

        f.db.resolve_report(report.id, f.moderator, ModeratorAction::WarnUser, None)
            .unwrap();

        let err = f
            .db
            .resolve_report(report.id, f.moderator, ModeratorAction::BanUser, None)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::AlreadyResolved {
                status: ReportStatus::Resolved,
                ..
            }
        ));

        // The first resolution stands
        let report = f.db.get_report(report.id).unwrap();
        assert_eq!(
            report.resolution.unwrap().action,
            ModeratorAction::WarnUser
        );
        assert_eq!(f.db.report_logs(report.id).unwrap().len(), 1);
        assert_eq!(
            f.db.get_user(f.author).unwrap().unwrap().status,
            AccountStatus::Active
        );

        assert!(matches!(
            f.db.resolve_report(9999, f.moderator, ModeratorAction::NoAction, None),
            Err(StorageError::ReportNotFound(9999))
        ));
    }

    #[test]
    fn test_failed_log_write_rolls_back() {
        let f = forum();
        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();

        f.db.pool
            .get()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_log_insert BEFORE INSERT ON moderation_logs
                 BEGIN SELECT RAISE(ABORT, 'log store unavailable'); END",
            )
            .unwrap();

        let err = f
            .db
            .resolve_report(report.id, f.moderator, ModeratorAction::DeleteContent, None)
            .unwrap_err();
        assert!(matches!(err, StorageError::Transaction(_)));
        assert!(err.is_retryable());

        let report = f.db.get_report(report.id).unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.resolution.is_none());
        assert!(f.db.get_content(ContentType::Post, f.post).unwrap().is_some());
    }

    #[test]
    fn test_reject_report() {
        let f = forum();
        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Misinformation))
            .unwrap();

        let rejected = f
            .db
            .reject_report(report.id, f.moderator, Some("not misinformation".to_string()))
            .unwrap();

        assert_eq!(rejected.status, ReportStatus::Rejected);
        assert_eq!(
            rejected.resolution.unwrap().action,
            ModeratorAction::NoAction
        );
        assert!(f.db.get_content(ContentType::Post, f.post).unwrap().is_some());

        let logs = f.db.report_logs(report.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].reason, "not misinformation");

        assert!(matches!(
            f.db.reject_report(report.id, f.moderator, None),
            Err(StorageError::AlreadyResolved {
                status: ReportStatus::Rejected,
                ..
            })
        ));
        assert!(matches!(
            f.db.resolve_report(report.id, f.moderator, ModeratorAction::NoAction, None),
            Err(StorageError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn test_scan_uses_enabled_filters() {
        let f = forum();

        let casino = f
            .db
            .create_filter(NewContentFilter {
                rule: FilterRule::keyword("casino", FilterCategory::Spam, FilterAction::Block),
                enabled: true,
                created_by: f.moderator,
            })
            .unwrap();

        let result = f
            .db
            .scan_content("visit the best casino in town", ContentType::Post)
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(result.blocked_by, Some(FilterCategory::Spam));

        f.db.set_filter_enabled(casino.id, false).unwrap();
        let result = f
            .db
            .scan_content("visit the best casino in town", ContentType::Post)
            .unwrap();
        assert!(result.allowed);
        assert!(result.is_clean());

        assert!(matches!(
            f.db.set_filter_enabled(casino.id + 1, true),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_filter_rejects_bad_regex() {
        let f = forum();

        let err = f
            .db
            .create_filter(NewContentFilter {
                rule: FilterRule::regex("([a-z", FilterCategory::Spam, FilterAction::Block),
                enabled: true,
                created_by: f.moderator,
            })
            .unwrap_err();

        assert!(matches!(err, StorageError::Validation(_)));
        assert!(f.db.get_filters().unwrap().is_empty());
    }

    #[test]
    fn test_enforce_filters() {
        let f = forum();
        let spam = f
            .db
            .create_content(ContentType::Post, f.author, "cheap pills at pillshop dot com")
            .unwrap();
        let adult = f
            .db
            .create_content(ContentType::Topic, f.author, "an explicit topic body")
            .unwrap();

        for (pattern, category) in [
            ("pills", FilterCategory::Spam),
            ("explicit", FilterCategory::AdultContent),
        ] {
            f.db.create_filter(NewContentFilter {
                rule: FilterRule::keyword(pattern, category, FilterAction::Block),
                enabled: true,
                created_by: f.moderator,
            })
            .unwrap();
        }

        let outcome = f.db.enforce_filters(ContentType::Post, spam).unwrap();
        assert_eq!(outcome.action, Some(AutomatedAction::DeleteContent));
        assert!(f.db.get_content(ContentType::Post, spam).unwrap().is_none());

        let logs = f.db.content_logs(ContentType::Post, spam).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(Some(logs[0].id), outcome.log_id);
        assert_eq!(logs[0].moderator_id, SYSTEM_MODERATOR_ID);
        assert_eq!(logs[0].action, ModeratorAction::DeleteContent);
        assert!(logs[0].metadata.automated_action);
        assert_eq!(
            logs[0].metadata.previous_content.as_deref(),
            Some("cheap pills at pillshop dot com")
        );

        let outcome = f.db.enforce_filters(ContentType::Topic, adult).unwrap();
        assert_eq!(outcome.action, Some(AutomatedAction::FlagForReview));
        assert!(f.db.get_content(ContentType::Topic, adult).unwrap().is_some());
        let logs = f.db.content_logs(ContentType::Topic, adult).unwrap();
        assert_eq!(logs[0].action, ModeratorAction::NoAction);
        assert!(logs[0].metadata.automated_action);

        // Clean content is left alone
        let outcome = f.db.enforce_filters(ContentType::Post, f.post).unwrap();
        assert!(outcome.action.is_none());
        assert!(outcome.log_id.is_none());
        assert!(f.db.content_logs(ContentType::Post, f.post).unwrap().is_empty());

        assert!(matches!(
            f.db.enforce_filters(ContentType::Post, spam),
            Err(StorageError::ContentNotFound { .. })
        ));
    }

    #[test]
    fn test_summarize() {
        let f = forum();
        let start = Utc::now() - Duration::minutes(1);

        let report = f
            .db
            .file_report(new_report(f.post, f.reporter, ReportReason::Spam))
            .unwrap();
        f.db.resolve_report(report.id, f.moderator, ModeratorAction::WarnUser, None)
            .unwrap();

        let metrics = f.db.summarize(start, Utc::now()).unwrap();
        assert_eq!(metrics.summary.total_reports, 1);
        assert_eq!(
            metrics.summary.by_status.get(&ReportStatus::Resolved),
            Some(&1)
        );
        assert_eq!(metrics.resolution_times.resolved_count, 1);
        assert!(metrics.resolution_times.min_ms >= 0);

        assert_eq!(metrics.moderator_performance.len(), 1);
        let perf = &metrics.moderator_performance[0];
        assert_eq!(perf.moderator_id, f.moderator);
        assert_eq!(perf.moderator_name.as_deref(), Some("mod"));
        assert_eq!(perf.actions.get(&ModeratorAction::WarnUser), Some(&1));

        assert!(matches!(
            f.db.summarize(Utc::now(), start),
            Err(StorageError::Validation(ValidationError::InvalidRange))
        ));

        let empty = f
            .db
            .summarize(start - Duration::days(2), start - Duration::days(1))
            .unwrap();
        assert_eq!(empty.summary.total_reports, 0);
        assert_eq!(empty.resolution_times.avg_ms, 0.0);
        assert!(empty.moderator_performance.is_empty());
    }

    #[test]
    fn test_moderation_config_round_trip() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.moderation_config().unwrap(), ModerationConfig::default());

        let mut config = ModerationConfig::default();
        config.priority.fresh_window_hours = 6;
        config.automated.spam = AutomatedAction::FlagForReview;
        db.set_moderation_config(&config).unwrap();

        assert_eq!(db.moderation_config().unwrap(), config);
    }

    #[test]
    fn test_out_of_range_config_is_refused() {
        let f = forum();

        let mut config = ModerationConfig::default();
        config.priority.fresh_window_hours = i64::MAX;
        assert!(matches!(
            f.db.set_moderation_config(&config),
            Err(StorageError::Validation(_))
        ));

        // Written behind the validating setter
        f.db.set_config(CONFIG_KEY, &serde_json::to_value(&config).unwrap())
            .unwrap();
        assert!(matches!(
            f.db.file_report(new_report(f.post, f.reporter, ReportReason::Spam)),
            Err(StorageError::Config(_))
        ));
        assert!(f.db.moderation_config().is_err());
    }

    #[test]
    fn test_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("warden.db");

        let report_id = {
            let db = Database::with_path(&path).unwrap();
            let author = db.create_user(new_user("author", UserRole::User)).unwrap();
            let post = db
                .create_content(ContentType::Post, author, "persisted post body")
                .unwrap();
            db.file_report(new_report(post, author, ReportReason::Copyright))
                .unwrap()
                .id
        };

        let db = Database::with_path(&path).unwrap();
        let report = db.get_report(report_id).unwrap();
        assert_eq!(report.reason, ReportReason::Copyright);
    }
}
