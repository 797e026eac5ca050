//! Content filter engine.
//!
//! Evaluation order is fixed:
//!
//! 1. Length bounds (flag only)
//! 2. Built-in forbidden patterns (flag only)
//! 3. Operator filters in the order given; the first matching `block`
//!    filter stops evaluation and disallows the content
//!
//! Flags from steps 1 and 2 never block on their own.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::rule::{FilterCategory, FilterRule, FilterType};

/// Default minimum content length in characters.
pub const DEFAULT_MIN_LENGTH: usize = 10;

/// Default maximum content length in characters.
pub const DEFAULT_MAX_LENGTH: usize = 50_000;

/// Built-in forbidden patterns as `(name, regex)` pairs.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("phone_number", r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b"),
    (
        "email_address",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    ),
    (
        "suspicious_domain",
        r"(?i)\b(?:https?://)?(?:www\.)?([a-z0-9-]+)\.(?:ru|cn|tk|ga)\b",
    ),
    (
        "sales_link",
        r"(?i)\b(?:buy|sell|cheap|discount|offer|price|deal|sale)\b.{0,30}\b(?:www|http)",
    ),
];

/// A named regular expression that flags content without blocking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenPattern {
    /// Short identifier shown in the flag reason.
    pub name: String,
    /// Regex source.
    pub pattern: String,
}

/// Static rules the engine applies before operator filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Content shorter than this is flagged.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Content longer than this is flagged.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Patterns that flag personal information, shady links and spam.
    #[serde(default = "default_forbidden_patterns")]
    pub forbidden_patterns: Vec<ForbiddenPattern>,
}

fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_forbidden_patterns() -> Vec<ForbiddenPattern> {
    BUILTIN_PATTERNS
        .iter()
        .map(|(name, pattern)| ForbiddenPattern {
            name: name.to_string(),
            pattern: pattern.to_string(),
        })
        .collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            forbidden_patterns: default_forbidden_patterns(),
        }
    }
}

/// Kind of flag raised during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Content length outside bounds.
    Length,
    /// A built-in forbidden pattern matched.
    Pattern,
    HateSpeech,
    AdultContent,
    Spam,
    PersonalInfo,
}

impl From<FilterCategory> for FlagKind {
    fn from(category: FilterCategory) -> Self {
        match category {
            FilterCategory::HateSpeech => FlagKind::HateSpeech,
            FilterCategory::AdultContent => FlagKind::AdultContent,
            FilterCategory::Spam => FlagKind::Spam,
            FilterCategory::PersonalInfo => FlagKind::PersonalInfo,
        }
    }
}

/// One finding from the filter engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub reason: String,
}

impl Flag {
    fn new(kind: FlagKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Outcome of evaluating a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// False iff a blocking operator filter matched.
    pub allowed: bool,
    /// Flags in evaluation order.
    pub flags: Vec<Flag>,
    /// Category of the blocking filter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<FilterCategory>,
}

impl ScanResult {
    /// Returns true if no flags were raised.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

struct CompiledPattern {
    name: String,
    regex: Regex,
}

/// Evaluates content against static rules and operator filters.
///
/// The engine is immutable once built; operator filters are passed per call
/// so a reloaded filter set takes effect on the next evaluation.
pub struct FilterEngine {
    min_length: usize,
    max_length: usize,
    patterns: Vec<CompiledPattern>,
}

impl FilterEngine {
    /// Creates an engine from configuration. Invalid forbidden patterns are
    /// logged and skipped.
    pub fn new(config: &FilterConfig) -> Self {
        let patterns = config
            .forbidden_patterns
            .iter()
            .filter_map(|p| match Regex::new(&p.pattern) {
                Ok(regex) => Some(CompiledPattern {
                    name: p.name.clone(),
                    regex,
                }),
                Err(e) => {
                    warn!(name = %p.name, error = %e, "Skipping invalid forbidden pattern");
                    None
                }
            })
            .collect();

        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            patterns,
        }
    }

    /// Evaluates `content` against the built-in rules and `filters`, in order.
    pub fn evaluate<'a, I>(&self, content: &str, filters: I) -> ScanResult
    where
        I: IntoIterator<Item = &'a FilterRule>,
    {
        let mut flags = Vec::new();

        let length = content.chars().count();
        if length < self.min_length {
            flags.push(Flag::new(FlagKind::Length, "Content is too short"));
        }
        if length > self.max_length {
            flags.push(Flag::new(FlagKind::Length, "Content is too long"));
        }

        for pattern in &self.patterns {
            if pattern.regex.is_match(content) {
                flags.push(Flag::new(
                    FlagKind::Pattern,
                    format!("Content contains forbidden pattern: {}", pattern.name),
                ));
            }
        }

        let lowered = content.to_lowercase();
        for filter in filters {
            if !Self::rule_matches(filter, content, &lowered) {
                continue;
            }

            flags.push(Flag::new(
                filter.category.into(),
                format!(
                    "Content matches {} filter: {}",
                    filter.filter_type.as_str(),
                    filter.category.as_str()
                ),
            ));

            if filter.action.is_block() {
                return ScanResult {
                    allowed: false,
                    flags,
                    blocked_by: Some(filter.category),
                };
            }
        }

        ScanResult {
            allowed: true,
            flags,
            blocked_by: None,
        }
    }

    fn rule_matches(rule: &FilterRule, content: &str, lowered: &str) -> bool {
        match rule.filter_type {
            FilterType::Keyword => lowered.contains(&rule.pattern.to_lowercase()),
            FilterType::Regex => match RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => regex.is_match(content),
                Err(e) => {
                    warn!(pattern = %rule.pattern, error = %e, "Invalid regex filter, treating as non-match");
                    false
                }
            },
            FilterType::Domain => {
                let source = format!(
                    r"\b(?:https?://)?(?:www\.)?{}\b",
                    regex::escape(&rule.pattern)
                );
                match RegexBuilder::new(&source).case_insensitive(true).build() {
                    Ok(regex) => regex.is_match(content),
                    Err(e) => {
                        warn!(pattern = %rule.pattern, error = %e, "Invalid domain filter, treating as non-match");
                        false
                    }
                }
            }
        }
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
