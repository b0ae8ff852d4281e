//! Error types for value parsing in tankwatch-types.

use thiserror::Error;

/// Errors that can occur when parsing selector and configuration values.
///
/// This error type is platform-agnostic and does not include transport
/// errors (those belong in tankwatch-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Granularity was not one of `minute`, `hour`, `day`.
    #[error("Invalid granularity '{0}': expected minute, hour or day")]
    InvalidGranularity(String),

    /// Tank selector was not `tank_<n>` or a bare number.
    #[error("Invalid tank selector '{0}': expected tank_<n>")]
    InvalidTank(String),

    /// Metric name was not recognized.
    #[error("Invalid metric '{0}': expected ph or temperature")]
    InvalidMetric(String),

    /// Fill strategy name was not recognized.
    #[error("Invalid fill strategy '{0}': expected first, nearest or average")]
    InvalidFill(String),
}

/// Result type alias using tankwatch-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
