//! Report, content and moderator-action vocabulary.
//!
//! Every enum here has a fixed snake_case wire/database representation
//! (`as_str` / `parse`) that matches its serde form.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minimum report description length in characters.
pub const DESCRIPTION_MIN_LEN: usize = 10;

/// Maximum report description length in characters.
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Kind of forum content a report or log entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A topic (thread starter).
    Topic,
    /// A reply inside a topic.
    Post,
}

impl ContentType {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Topic => "topic",
            ContentType::Post => "post",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "topic" => Some(ContentType::Topic),
            "post" => Some(ContentType::Post),
            _ => None,
        }
    }

    /// Name of the forum table holding this kind of content.
    pub fn table(&self) -> &'static str {
        match self {
            ContentType::Topic => "topics",
            ContentType::Post => "posts",
        }
    }
}

/// Why a user reported a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    HateSpeech,
    Harassment,
    Spam,
    AdultContent,
    Misinformation,
    PersonalInfo,
    Copyright,
    Other,
}

impl ReportReason {
    /// Returns all report reasons.
    pub fn all() -> &'static [ReportReason] {
        &[
            ReportReason::HateSpeech,
            ReportReason::Harassment,
            ReportReason::Spam,
            ReportReason::AdultContent,
            ReportReason::Misinformation,
            ReportReason::PersonalInfo,
            ReportReason::Copyright,
            ReportReason::Other,
        ]
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::HateSpeech => "hate_speech",
            ReportReason::Harassment => "harassment",
            ReportReason::Spam => "spam",
            ReportReason::AdultContent => "adult_content",
            ReportReason::Misinformation => "misinformation",
            ReportReason::PersonalInfo => "personal_info",
            ReportReason::Copyright => "copyright",
            ReportReason::Other => "other",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|r| r.as_str() == s)
    }
}

/// Lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Filed, waiting for a moderator.
    #[default]
    Pending,
    /// Claimed by a moderator.
    InReview,
    /// Closed with a moderator action.
    Resolved,
    /// Closed as unfounded.
    Rejected,
}

impl ReportStatus {
    /// Returns all statuses.
    pub fn all() -> &'static [ReportStatus] {
        &[
            ReportStatus::Pending,
            ReportStatus::InReview,
            ReportStatus::Resolved,
            ReportStatus::Rejected,
        ]
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::InReview => "in_review",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|st| st.as_str() == s)
    }

    /// Open reports still count against the one-per-reporter rule.
    pub fn is_open(&self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::InReview)
    }
}

/// Moderator queue priority. Ordering follows urgency (`Low < Urgent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ReportPriority {
    /// Returns all priorities, least urgent first.
    pub fn all() -> &'static [ReportPriority] {
        &[
            ReportPriority::Low,
            ReportPriority::Medium,
            ReportPriority::High,
            ReportPriority::Urgent,
        ]
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPriority::Low => "low",
            ReportPriority::Medium => "medium",
            ReportPriority::High => "high",
            ReportPriority::Urgent => "urgent",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.as_str() == s)
    }

    /// Numeric rank used for queue ordering (higher = more urgent).
    pub fn rank(&self) -> i32 {
        match self {
            ReportPriority::Low => 0,
            ReportPriority::Medium => 1,
            ReportPriority::High => 2,
            ReportPriority::Urgent => 3,
        }
    }
}

/// Decision a moderator takes when resolving a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeratorAction {
    NoAction,
    EditContent,
    DeleteContent,
    WarnUser,
    SuspendUser,
    BanUser,
}

impl ModeratorAction {
    /// Returns all moderator actions.
    pub fn all() -> &'static [ModeratorAction] {
        &[
            ModeratorAction::NoAction,
            ModeratorAction::EditContent,
            ModeratorAction::DeleteContent,
            ModeratorAction::WarnUser,
            ModeratorAction::SuspendUser,
            ModeratorAction::BanUser,
        ]
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeratorAction::NoAction => "no_action",
            ModeratorAction::EditContent => "edit_content",
            ModeratorAction::DeleteContent => "delete_content",
            ModeratorAction::WarnUser => "warn_user",
            ModeratorAction::SuspendUser => "suspend_user",
            ModeratorAction::BanUser => "ban_user",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.as_str() == s)
    }

    /// The side effect this action has on forum data.
    pub fn effect(&self) -> ActionEffect {
        match self {
            ModeratorAction::NoAction => ActionEffect::None,
            // Editing happens in the forum itself; warnings go out through the notifier.
            ModeratorAction::EditContent => ActionEffect::None,
            ModeratorAction::WarnUser => ActionEffect::None,
            ModeratorAction::DeleteContent => ActionEffect::DeleteContent,
            ModeratorAction::SuspendUser => ActionEffect::SetAuthorStatus(AccountStatus::Suspended),
            ModeratorAction::BanUser => ActionEffect::SetAuthorStatus(AccountStatus::Banned),
        }
    }
}

/// Forum-side consequence of a moderator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// Only the audit log is written.
    None,
    /// The reported content row is removed.
    DeleteContent,
    /// The content author's account status is changed.
    SetAuthorStatus(AccountStatus),
}

/// Account status of a forum user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Banned,
}

impl AccountStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Banned => "banned",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AccountStatus::Active),
            "suspended" => Some(AccountStatus::Suspended),
            "banned" => Some(AccountStatus::Banned),
            _ => None,
        }
    }
}

/// Role of a forum user, as seen by the moderation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "moderator" => Some(UserRole::Moderator),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Whether this role may work the moderation queue.
    pub fn can_moderate(&self) -> bool {
        matches!(self, UserRole::Moderator | UserRole::Admin)
    }
}

/// Checks a report description against the allowed length range.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    let len = description.trim().chars().count();
    if len < DESCRIPTION_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "description",
            min: DESCRIPTION_MIN_LEN,
            actual: len,
        });
    }
    if len > DESCRIPTION_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "description",
            max: DESCRIPTION_MAX_LEN,
            actual: len,
        });
    }
    Ok(())
}
