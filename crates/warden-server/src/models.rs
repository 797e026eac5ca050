//! API request and response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::filter::ScanResult;
use warden_core::{ContentType, ModeratorAction, ReportPriority, ReportReason, ReportStatus};
use warden_storage::models::{ModerationLog, Report, DEFAULT_PAGE_SIZE};

/// Request body for POST /api/reports.
#[derive(Debug, Deserialize)]
pub struct FileReportRequest {
    pub content_id: i64,
    pub content_type: ContentType,
    pub reason: ReportReason,
    pub description: String,
    #[serde(default)]
    pub evidence: Option<String>,
}

/// Query parameters for GET /api/reports.
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
    /// 1-based page number (default: 1).
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size (default: 20).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Response body for GET /api/reports/{id}.
#[derive(Debug, Serialize)]
pub struct ReportDetailResponse {
    pub report: Report,
    /// Audit entries written for the report, oldest first.
    pub logs: Vec<ModerationLog>,
}

/// Request body for POST /api/reports/{id}/resolve.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub action: ModeratorAction,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for POST /api/reports/{id}/reject.
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for POST /api/scan.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub content: String,
    pub content_type: ContentType,
}

/// Response body for POST /api/scan.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    #[serde(flatten)]
    pub result: ScanResult,
}

/// Query parameters for GET /api/metrics.
///
/// A missing `end` means now; a missing `start` means seven days before `end`.
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}
