//! Warden Storage - SQLite persistence and moderation operations.
//!
//! This crate owns all moderation state and the operations that change it:
//!
//! - Report filing with duplicate, existence and abuse-limit checks
//! - The prioritized moderator queue
//! - Atomic report resolution with an append-only audit log
//! - Operator filters, content scans and automated enforcement
//! - Moderation metrics over a time window
//!
//! # Example
//!
//! ```no_run
//! use warden_core::{ContentType, ModeratorAction, ReportReason, UserRole};
//! use warden_storage::{models::{NewReport, NewUser}, Database};
//!
//! let db = Database::in_memory().unwrap();
//! let author = db.create_user(NewUser {
//!     name: "author".to_string(),
//!     email: None,
//!     role: UserRole::User,
//! }).unwrap();
//! let post = db.create_content(ContentType::Post, author, "buy cheap watches").unwrap();
//!
//! let report = db.file_report(NewReport {
//!     content_type: ContentType::Post,
//!     content_id: post,
//!     reporter_id: author,
//!     reason: ReportReason::Spam,
//!     description: "advertising in the help forum".to_string(),
//!     evidence: None,
//! }).unwrap();
//!
//! db.resolve_report(report.id, 1, ModeratorAction::DeleteContent, None).unwrap();
//! ```

mod database;
pub mod error;
pub mod models;
mod pool;
pub mod repository;
mod schema;

pub use database::Database;
pub use error::{Result, StorageError};
pub use models::{
    ContentFilter, ContentRecord, EnforcementOutcome, LogMetadata, ModerationLog,
    ModerationMetrics, ModeratorPerformance, NewContentFilter, NewReport, NewUser, Report,
    ReportPage, ReportQuery, ReportSummary, Resolution, ResolutionTimes, User,
};
pub use pool::ConnectionPool;
