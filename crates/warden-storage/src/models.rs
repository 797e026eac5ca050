//! Data models for storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::config::AutomatedAction;
use warden_core::filter::{FilterRule, ScanResult};
use warden_core::{
    AccountStatus, ContentType, ModeratorAction, ReportPriority, ReportReason, ReportStatus,
    UserRole,
};

/// Default page size for report listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest accepted page size for report listings.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Outcome recorded when a report is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Action the moderator took.
    pub action: ModeratorAction,
    /// Optional moderator note.
    pub note: Option<String>,
    /// Moderator who closed the report.
    pub moderator_id: i64,
    /// When the report was closed.
    pub timestamp: DateTime<Utc>,
}

/// A user complaint about one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub content_type: ContentType,
    pub content_id: i64,
    pub reporter_id: i64,
    pub reason: ReportReason,
    pub description: String,
    pub evidence: Option<String>,
    pub status: ReportStatus,
    /// Fixed when the report is filed.
    pub priority: ReportPriority,
    /// Moderator who claimed the report.
    pub assigned_to: Option<i64>,
    pub resolution: Option<Resolution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for filing a report.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub content_type: ContentType,
    pub content_id: i64,
    pub reporter_id: i64,
    pub reason: ReportReason,
    pub description: String,
    pub evidence: Option<String>,
}

/// Filters and paging for the moderator queue.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
    /// 1-based page number.
    pub page: i64,
    pub limit: i64,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReportQuery {
    /// Row offset of the first report on the requested page, or `None` when
    /// the page lies beyond any representable offset.
    pub fn offset(&self) -> Option<i64> {
        self.page.checked_sub(1)?.checked_mul(self.limit)
    }
}

/// One page of the moderator queue.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Extra context stored with an audit entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMetadata {
    /// Report that led to the action, if any.
    pub report_id: Option<i64>,
    /// Body of the content before it was removed.
    pub previous_content: Option<String>,
    /// True when the action came from automated filtering.
    pub automated_action: bool,
}

/// Immutable audit record of a moderation decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationLog {
    pub id: i64,
    pub content_type: ContentType,
    pub content_id: i64,
    pub moderator_id: i64,
    pub action: ModeratorAction,
    pub reason: String,
    pub metadata: LogMetadata,
    pub created_at: DateTime<Utc>,
}

/// Parameters for appending an audit record.
#[derive(Debug, Clone)]
pub struct NewModerationLog {
    pub content_type: ContentType,
    pub content_id: i64,
    pub moderator_id: i64,
    pub action: ModeratorAction,
    pub reason: String,
    pub metadata: LogMetadata,
}

/// An operator-defined content filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFilter {
    pub id: i64,
    #[serde(flatten)]
    pub rule: FilterRule,
    pub enabled: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a content filter.
#[derive(Debug, Clone)]
pub struct NewContentFilter {
    pub rule: FilterRule,
    pub enabled: bool,
    pub created_by: i64,
}

/// What automated enforcement did with a piece of stored content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnforcementOutcome {
    /// Filter evaluation of the stored body.
    pub scan: ScanResult,
    /// Action taken, if a blocking filter matched.
    pub action: Option<AutomatedAction>,
    /// Audit entry written for the action.
    pub log_id: Option<i64>,
}

/// The parts of a topic or post the moderation core reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i64,
    pub content_type: ContentType,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The parts of a forum user the moderation core reads and patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub status: AccountStatus,
    pub status_updated_at: Option<DateTime<Utc>>,
}

/// Parameters for creating a forum user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
}

/// Application configuration stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration key.
    pub key: String,
    /// Configuration value (JSON).
    pub value: serde_json::Value,
}

/// Report counts for a window, each dimension bucketed independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_reports: i64,
    pub by_status: BTreeMap<ReportStatus, i64>,
    pub by_reason: BTreeMap<ReportReason, i64>,
    pub by_priority: BTreeMap<ReportPriority, i64>,
}

/// Time from filing to resolution, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionTimes {
    pub resolved_count: i64,
    pub avg_ms: f64,
    pub min_ms: i64,
    pub max_ms: i64,
}

/// Actions logged by one moderator in a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratorPerformance {
    pub moderator_id: i64,
    pub moderator_name: Option<String>,
    pub moderator_email: Option<String>,
    pub actions: BTreeMap<ModeratorAction, i64>,
    pub total_actions: i64,
}

/// Moderation dashboard metrics for an inclusive time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationMetrics {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: ReportSummary,
    pub resolution_times: ResolutionTimes,
    pub moderator_performance: Vec<ModeratorPerformance>,
}
