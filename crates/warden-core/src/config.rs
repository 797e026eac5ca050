//! Moderation policy configuration.
//!
//! The whole policy is one serializable value. It is stored as JSON in the
//! database `config` table and injected into the filter engine and priority
//! policy when they are built, so operators can tune it without code changes.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::filter::{FilterCategory, FilterConfig, FilterEngine};
use crate::priority::PriorityPolicy;

/// Config table key holding the serialized [`ModerationConfig`].
pub const CONFIG_KEY: &str = "moderation";

/// Default cap on reports one user may file per rolling day.
pub const DEFAULT_MAX_REPORTS_PER_USER_PER_DAY: u32 = 10;

/// Default cap on simultaneously open reports against one piece of content.
pub const DEFAULT_MAX_OPEN_REPORTS_PER_CONTENT: u32 = 5;

/// Moderator id recorded on automated log entries.
pub const SYSTEM_MODERATOR_ID: i64 = 0;

/// Complete moderation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub priority: PriorityPolicy,
    #[serde(default)]
    pub limits: ReportLimits,
    #[serde(default)]
    pub automated: AutomatedActions,
}

impl ModerationConfig {
    /// Builds a filter engine for this configuration.
    pub fn filter_engine(&self) -> FilterEngine {
        FilterEngine::new(&self.filter)
    }

    /// Checks the values that have a valid range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.priority.validate()
    }
}

/// Abuse limits on report filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLimits {
    #[serde(default = "default_per_user_per_day")]
    pub max_reports_per_user_per_day: u32,
    #[serde(default = "default_open_per_content")]
    pub max_open_reports_per_content: u32,
}

fn default_per_user_per_day() -> u32 {
    DEFAULT_MAX_REPORTS_PER_USER_PER_DAY
}

fn default_open_per_content() -> u32 {
    DEFAULT_MAX_OPEN_REPORTS_PER_CONTENT
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_reports_per_user_per_day: DEFAULT_MAX_REPORTS_PER_USER_PER_DAY,
            max_open_reports_per_content: DEFAULT_MAX_OPEN_REPORTS_PER_CONTENT,
        }
    }
}

/// What automated enforcement does with content a blocking filter caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomatedAction {
    /// Remove the content.
    DeleteContent,
    /// Keep the content and leave it to a moderator.
    FlagForReview,
}

/// Automated action per blocking category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatedActions {
    #[serde(default = "delete")]
    pub spam: AutomatedAction,
    #[serde(default = "delete")]
    pub personal_info: AutomatedAction,
    #[serde(default = "review")]
    pub adult_content: AutomatedAction,
    #[serde(default = "review")]
    pub hate_speech: AutomatedAction,
}

fn delete() -> AutomatedAction {
    AutomatedAction::DeleteContent
}

fn review() -> AutomatedAction {
    AutomatedAction::FlagForReview
}

impl Default for AutomatedActions {
    fn default() -> Self {
        Self {
            spam: AutomatedAction::DeleteContent,
            personal_info: AutomatedAction::DeleteContent,
            adult_content: AutomatedAction::FlagForReview,
            hate_speech: AutomatedAction::FlagForReview,
        }
    }
}

impl AutomatedActions {
    /// Returns the action configured for `category`.
    pub fn for_category(&self, category: FilterCategory) -> AutomatedAction {
        match category {
            FilterCategory::Spam => self.spam,
            FilterCategory::PersonalInfo => self.personal_info,
            FilterCategory::AdultContent => self.adult_content,
            FilterCategory::HateSpeech => self.hate_speech,
        }
    }
}
