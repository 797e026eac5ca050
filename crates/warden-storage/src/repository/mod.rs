//! Database repositories for each table.

pub mod config;
pub mod content;
pub mod filters;
pub mod logs;
pub mod metrics;
pub mod reports;
pub mod users;

pub use config::ConfigRepo;
pub use content::ContentRepo;
pub use filters::FiltersRepo;
pub use logs::LogsRepo;
pub use metrics::MetricsRepo;
pub use reports::ReportsRepo;
pub use users::UsersRepo;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;

/// Format a timestamp for storage.
///
/// All timestamps share one fixed-width UTC format so that string
/// comparison in SQL matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp column, accepting RFC 3339 or SQLite's
/// `datetime('now')` format.
pub(crate) fn parse_datetime(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S")
                .map(|dt| dt.and_utc())
        })
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an enum column, turning unknown values into a conversion error.
pub(crate) fn parse_enum<T>(
    idx: usize,
    value: String,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value: {}", value).into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_as_strings() {
        let a = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1);
        let c = a + chrono::Duration::hours(15);

        assert!(format_timestamp(a) < format_timestamp(b));
        assert!(format_timestamp(b) < format_timestamp(c));
        assert_eq!(format_timestamp(a), "2026-01-01T09:00:00.000Z");
    }

    #[test]
    fn test_parse_datetime_formats() {
        let ts = parse_datetime(0, "2026-01-01T09:00:00.250Z".into()).unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);

        let legacy = parse_datetime(0, "2026-01-01 09:00:00".into()).unwrap();
        assert_eq!(legacy, Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        let err = parse_datetime(4, "yesterday-ish".into()).unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, _)
        ));
    }

    #[test]
    fn test_parse_enum_rejects_unknown() {
        assert!(parse_enum(0, "pending".into(), warden_core::ReportStatus::parse).is_ok());
        assert!(parse_enum(0, "bogus".into(), warden_core::ReportStatus::parse).is_err());
    }
}
