//! Operator-defined filter rules.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How a filter's pattern is matched against content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Case-insensitive substring.
    Keyword,
    /// Case-insensitive regular expression.
    Regex,
    /// Host name, with optional scheme and `www.` prefix.
    Domain,
}

impl FilterType {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Keyword => "keyword",
            FilterType::Regex => "regex",
            FilterType::Domain => "domain",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "keyword" => Some(FilterType::Keyword),
            "regex" => Some(FilterType::Regex),
            "domain" => Some(FilterType::Domain),
            _ => None,
        }
    }
}

/// What a filter is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    HateSpeech,
    AdultContent,
    Spam,
    PersonalInfo,
}

impl FilterCategory {
    /// Returns all categories.
    pub fn all() -> &'static [FilterCategory] {
        &[
            FilterCategory::HateSpeech,
            FilterCategory::AdultContent,
            FilterCategory::Spam,
            FilterCategory::PersonalInfo,
        ]
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::HateSpeech => "hate_speech",
            FilterCategory::AdultContent => "adult_content",
            FilterCategory::Spam => "spam",
            FilterCategory::PersonalInfo => "personal_info",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == s)
    }
}

/// What happens when a filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    /// Record a flag and keep evaluating.
    #[default]
    Flag,
    /// Record a flag and stop; the content is not allowed.
    Block,
    /// Record a flag and keep evaluating; deletion is decided downstream.
    Delete,
}

impl FilterAction {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterAction::Flag => "flag",
            FilterAction::Block => "block",
            FilterAction::Delete => "delete",
        }
    }

    /// Parse from database string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flag" => Some(FilterAction::Flag),
            "block" => Some(FilterAction::Block),
            "delete" => Some(FilterAction::Delete),
            _ => None,
        }
    }

    /// Returns true if a match stops evaluation.
    pub fn is_block(&self) -> bool {
        matches!(self, FilterAction::Block)
    }
}

/// The matching part of an operator filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Match strategy.
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Keyword, regex source or domain, depending on `filter_type`.
    pub pattern: String,
    /// Category recorded on the flag.
    pub category: FilterCategory,
    /// Consequence of a match.
    pub action: FilterAction,
}

impl FilterRule {
    /// Creates a new filter rule.
    pub fn new(
        filter_type: FilterType,
        pattern: impl Into<String>,
        category: FilterCategory,
        action: FilterAction,
    ) -> Self {
        Self {
            filter_type,
            pattern: pattern.into(),
            category,
            action,
        }
    }

    /// Creates a keyword rule.
    pub fn keyword(pattern: impl Into<String>, category: FilterCategory, action: FilterAction) -> Self {
        Self::new(FilterType::Keyword, pattern, category, action)
    }

    /// Creates a regex rule.
    pub fn regex(pattern: impl Into<String>, category: FilterCategory, action: FilterAction) -> Self {
        Self::new(FilterType::Regex, pattern, category, action)
    }

    /// Creates a domain rule.
    pub fn domain(pattern: impl Into<String>, category: FilterCategory, action: FilterAction) -> Self {
        Self::new(FilterType::Domain, pattern, category, action)
    }

    /// Checks that the rule can be stored.
    ///
    /// Regex rules must compile; the engine would otherwise skip them on
    /// every evaluation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pattern.trim().is_empty() {
            return Err(ValidationError::TooShort {
                field: "pattern",
                min: 1,
                actual: 0,
            });
        }

        if self.filter_type == FilterType::Regex {
            regex::Regex::new(&self.pattern).map_err(|_| ValidationError::InvalidValue {
                field: "pattern",
                value: self.pattern.clone(),
            })?;
        }

        Ok(())
    }
}
