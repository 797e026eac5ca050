//! Warden Core - moderation domain logic.
//!
//! Pure, I/O-free building blocks of the moderation pipeline:
//!
//! - [`filter`] evaluates text against built-in and operator rules
//! - [`priority`] assigns a queue priority to new reports
//! - [`report`] defines the report, action and account vocabulary
//! - [`config`] bundles the tunable policy into one value
//!
//! # Example
//!
//! ```
//! use warden_core::filter::{FilterAction, FilterCategory, FilterEngine, FilterRule};
//!
//! let engine = FilterEngine::default();
//! let filters = [FilterRule::keyword("casino", FilterCategory::Spam, FilterAction::Block)];
//!
//! let result = engine.evaluate("win big at the casino tonight", &filters);
//! assert!(!result.allowed);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod priority;
pub mod report;

pub use config::ModerationConfig;
pub use error::ValidationError;
pub use priority::PriorityPolicy;
pub use report::{
    AccountStatus, ActionEffect, ContentType, ModeratorAction, ReportPriority, ReportReason,
    ReportStatus, UserRole,
};
