//! API route handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use tracing::debug;
use warden_storage::models::{ModerationMetrics, NewReport, Report, ReportPage, ReportQuery};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::identity::{Caller, Moderator};
use crate::models::{
    FileReportRequest, ListReportsQuery, MetricsQuery, RejectRequest, ReportDetailResponse,
    ResolveRequest, ScanRequest, ScanResponse,
};
use crate::state::AppState;

/// Default metrics window when no start is given.
const DEFAULT_METRICS_DAYS: i64 = 7;

/// POST /api/reports - File a report as the calling user.
pub async fn file_report(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(req): ApiJson<FileReportRequest>,
) -> Result<(StatusCode, Json<Report>)> {
    debug!(
        reporter_id = caller.user_id,
        content_type = req.content_type.as_str(),
        content_id = req.content_id,
        "Filing report"
    );

    let report = state.db.file_report(NewReport {
        content_type: req.content_type,
        content_id: req.content_id,
        reporter_id: caller.user_id,
        reason: req.reason,
        description: req.description,
        evidence: req.evidence,
    })?;

    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/reports - List the moderator queue.
pub async fn list_reports(
    State(state): State<AppState>,
    _moderator: Moderator,
    ApiQuery(query): ApiQuery<ListReportsQuery>,
) -> Result<Json<ReportPage>> {
    let page = state.db.list_reports(&ReportQuery {
        status: query.status,
        priority: query.priority,
        page: query.page,
        limit: query.limit,
    })?;

    Ok(Json(page))
}

/// GET /api/reports/{id} - Get a report with its audit trail.
pub async fn get_report(
    State(state): State<AppState>,
    _moderator: Moderator,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ReportDetailResponse>> {
    let report = state.db.get_report(id)?;
    let logs = state.db.report_logs(id)?;

    Ok(Json(ReportDetailResponse { report, logs }))
}

/// POST /api/reports/{id}/claim - Take a report into review.
pub async fn claim_report(
    State(state): State<AppState>,
    Moderator(caller): Moderator,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Report>> {
    let report = state.db.claim_report(id, caller.user_id)?;
    Ok(Json(report))
}

/// POST /api/reports/{id}/resolve - Resolve a report with an action.
pub async fn resolve_report(
    State(state): State<AppState>,
    Moderator(caller): Moderator,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ResolveRequest>,
) -> Result<Json<Report>> {
    let report = state
        .db
        .resolve_report(id, caller.user_id, req.action, req.note)?;
    Ok(Json(report))
}

/// POST /api/reports/{id}/reject - Reject a report.
pub async fn reject_report(
    State(state): State<AppState>,
    Moderator(caller): Moderator,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<RejectRequest>,
) -> Result<Json<Report>> {
    let report = state.db.reject_report(id, caller.user_id, req.note)?;
    Ok(Json(report))
}

/// POST /api/scan - Check content before it is published.
pub async fn scan_content(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScanRequest>,
) -> Result<Json<ScanResponse>> {
    let result = state.db.scan_content(&req.content, req.content_type)?;
    Ok(Json(ScanResponse { result }))
}

/// GET /api/metrics - Moderation metrics for a time window.
pub async fn get_metrics(
    State(state): State<AppState>,
    _moderator: Moderator,
    ApiQuery(query): ApiQuery<MetricsQuery>,
) -> Result<Json<ModerationMetrics>> {
    let end = query.end.unwrap_or_else(Utc::now);
    let start = query
        .start
        .unwrap_or(end - Duration::days(DEFAULT_METRICS_DAYS));

    let metrics = state.db.summarize(start, end)?;
    Ok(Json(metrics))
}
