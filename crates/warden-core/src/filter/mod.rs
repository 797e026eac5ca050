//! Content filtering for forum posts and topics.
//!
//! Built-in rules flag suspicious content; operator-defined rules can also
//! block it.

mod engine;
mod rule;

pub use engine::{
    FilterConfig, FilterEngine, Flag, FlagKind, ForbiddenPattern, ScanResult, DEFAULT_MAX_LENGTH,
    DEFAULT_MIN_LENGTH,
};
pub use rule::{FilterAction, FilterCategory, FilterRule, FilterType};
