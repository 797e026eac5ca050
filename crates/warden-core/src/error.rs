//! Core error types.

use thiserror::Error;

/// Malformed moderation input, rejected before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A text field is shorter than allowed.
    #[error("{field} must be at least {min} characters (got {actual})")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },

    /// A text field is longer than allowed.
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// A value outside a closed enumeration.
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// A date range whose start is after its end.
    #[error("invalid range: start is after end")]
    InvalidRange,
}
