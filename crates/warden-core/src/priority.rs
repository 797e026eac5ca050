//! Report priority policy.
//!
//! Priority depends on how severe the report reason is and whether the
//! reported content is still fresh. It is computed once, when the report is
//! filed, and never revisited.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::report::{ReportPriority, ReportReason};

/// Content younger than this many hours counts as fresh.
pub const DEFAULT_FRESH_WINDOW_HOURS: i64 = 24;

/// Longest accepted fresh window (ten years).
pub const MAX_FRESH_WINDOW_HOURS: i64 = 24 * 365 * 10;

/// Maps (reason, content age) to a queue priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityPolicy {
    /// Age threshold separating fresh from stale content.
    #[serde(default = "default_fresh_window_hours")]
    pub fresh_window_hours: i64,
    /// Reasons that are `urgent` when fresh and `high` otherwise.
    #[serde(default = "default_severe")]
    pub severe: Vec<ReportReason>,
    /// Reasons that are `high` when fresh and `medium` otherwise.
    #[serde(default = "default_serious")]
    pub serious: Vec<ReportReason>,
}

fn default_fresh_window_hours() -> i64 {
    DEFAULT_FRESH_WINDOW_HOURS
}

fn default_severe() -> Vec<ReportReason> {
    vec![
        ReportReason::HateSpeech,
        ReportReason::Harassment,
        ReportReason::PersonalInfo,
    ]
}

fn default_serious() -> Vec<ReportReason> {
    vec![ReportReason::AdultContent, ReportReason::Misinformation]
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            fresh_window_hours: DEFAULT_FRESH_WINDOW_HOURS,
            severe: default_severe(),
            serious: default_serious(),
        }
    }
}

impl PriorityPolicy {
    /// Rejects a fresh window outside `1..=MAX_FRESH_WINDOW_HOURS`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_FRESH_WINDOW_HOURS).contains(&self.fresh_window_hours) {
            return Err(ValidationError::InvalidValue {
                field: "fresh_window_hours",
                value: self.fresh_window_hours.to_string(),
            });
        }
        Ok(())
    }

    /// Computes the priority of a report filed at `now`.
    ///
    /// Content with a creation time in the future is treated as fresh.
    pub fn compute(
        &self,
        reason: ReportReason,
        content_created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ReportPriority {
        let age = now - content_created_at;
        let fresh = match TimeDelta::try_hours(self.fresh_window_hours) {
            Some(window) => age < window,
            // Beyond the representable range every age is on one side
            None => self.fresh_window_hours > 0,
        };

        let (if_fresh, if_stale) = if self.severe.contains(&reason) {
            (ReportPriority::Urgent, ReportPriority::High)
        } else if self.serious.contains(&reason) {
            (ReportPriority::High, ReportPriority::Medium)
        } else {
            (ReportPriority::Medium, ReportPriority::Low)
        };

        if fresh {
            if_fresh
        } else {
            if_stale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_age(hours: i64, minutes: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now - TimeDelta::hours(hours) - TimeDelta::minutes(minutes), now)
    }

    fn compute(reason: ReportReason, hours: i64, minutes: i64) -> ReportPriority {
        let (created, now) = at_age(hours, minutes);
        PriorityPolicy::default().compute(reason, created, now)
    }

    #[test]
    fn severe_reasons() {
        for reason in [
            ReportReason::HateSpeech,
            ReportReason::Harassment,
            ReportReason::PersonalInfo,
        ] {
            assert_eq!(compute(reason, 0, 5), ReportPriority::Urgent);
            assert_eq!(compute(reason, 23, 59), ReportPriority::Urgent);
            assert_eq!(compute(reason, 24, 0), ReportPriority::High);
            assert_eq!(compute(reason, 240, 0), ReportPriority::High);
        }
    }

    #[test]
    fn serious_reasons() {
        for reason in [ReportReason::AdultContent, ReportReason::Misinformation] {
            assert_eq!(compute(reason, 1, 0), ReportPriority::High);
            assert_eq!(compute(reason, 24, 0), ReportPriority::Medium);
        }
    }

    #[test]
    fn other_reasons() {
        for reason in [
            ReportReason::Spam,
            ReportReason::Copyright,
            ReportReason::Other,
        ] {
            assert_eq!(compute(reason, 2, 0), ReportPriority::Medium);
            assert_eq!(compute(reason, 30, 0), ReportPriority::Low);
        }
    }

    #[test]
    fn future_content_counts_as_fresh() {
        let now = Utc::now();
        let created = now + TimeDelta::hours(3);
        let priority = PriorityPolicy::default().compute(ReportReason::Spam, created, now);
        assert_eq!(priority, ReportPriority::Medium);
    }

    #[test]
    fn custom_window_and_tiers() {
        let policy = PriorityPolicy {
            fresh_window_hours: 1,
            severe: vec![ReportReason::Spam],
            serious: vec![],
        };
        let now = Utc::now();
        let two_hours_ago = now - TimeDelta::hours(2);

        assert_eq!(
            policy.compute(ReportReason::Spam, now, now),
            ReportPriority::Urgent
        );
        assert_eq!(
            policy.compute(ReportReason::Spam, two_hours_ago, now),
            ReportPriority::High
        );
        assert_eq!(
            policy.compute(ReportReason::AdultContent, two_hours_ago, now),
            ReportPriority::Low
        );
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let policy: PriorityPolicy = serde_json::from_str(r#"{"fresh_window_hours": 48}"#).unwrap();
        assert_eq!(policy.fresh_window_hours, 48);
        assert_eq!(policy.severe, default_severe());
    }

    #[test]
    fn out_of_range_window_does_not_panic() {
        let now = Utc::now();
        let created = now - TimeDelta::days(400);

        let huge = PriorityPolicy {
            fresh_window_hours: i64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.compute(ReportReason::Spam, created, now), ReportPriority::Medium);
        assert!(huge.validate().is_err());

        let negative = PriorityPolicy {
            fresh_window_hours: i64::MIN,
            ..Default::default()
        };
        assert_eq!(negative.compute(ReportReason::Spam, now, now), ReportPriority::Low);
        assert!(negative.validate().is_err());

        assert!(PriorityPolicy::default().validate().is_ok());
    }
}
