// crates/telemetry-ingest-core/src/core/time.rs
// ============================================================================
// Module: Telemetry Ingest Time Model
// Description: Log timestamps and their conversion to absolute UTC instants.
// Purpose: Keep nanosecond log time distinct from persisted wall-clock instants.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Recorded logs stamp every message with signed nanoseconds since the unix
//! epoch. Persisted facts are keyed by an absolute UTC instant derived from
//! that value. The conversion never consults the wall clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Log Timestamps
// ============================================================================

/// Nanoseconds since the unix epoch as recorded in the log.
///
/// # Invariants
/// - Values are taken verbatim from the log; ordering is not validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogTimestamp(i64);

impl LogTimestamp {
    /// Wraps a nanosecond value.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Returns the raw nanosecond value.
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Converts the log time into an absolute UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] when the instant cannot be represented.
    pub fn to_utc(self) -> Result<OffsetDateTime, TimeError> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0))
            .map_err(|err| TimeError::OutOfRange(err.to_string()))
    }
}

impl fmt::Display for LogTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Time conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// Instant falls outside the representable calendar range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
    /// Instant could not be rendered as text.
    #[error("timestamp formatting failed: {0}")]
    Format(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a UTC instant as RFC 3339 text.
///
/// # Errors
///
/// Returns [`TimeError::Format`] when the instant cannot be formatted.
pub fn format_rfc3339(instant: OffsetDateTime) -> Result<String, TimeError> {
    instant.format(&Rfc3339).map_err(|err| TimeError::Format(err.to_string()))
}

/// Parses RFC 3339 text back into a UTC instant.
///
/// # Errors
///
/// Returns [`TimeError::Format`] when the text is not valid RFC 3339.
pub fn parse_rfc3339(text: &str) -> Result<OffsetDateTime, TimeError> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|err| TimeError::Format(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;

    #[test]
    fn log_timestamp_converts_to_utc_with_nanosecond_precision() {
        let instant = LogTimestamp::from_nanos(1_700_000_000_123_456_789).to_utc().expect("utc");
        assert_eq!(instant.unix_timestamp(), 1_700_000_000);
        assert_eq!(instant.nanosecond(), 123_456_789);
        assert_eq!(instant.offset(), time::UtcOffset::UTC);
    }

    #[test]
    fn negative_log_timestamps_precede_the_epoch() {
        let instant = LogTimestamp::from_nanos(-1).to_utc().expect("utc");
        assert_eq!(instant.unix_timestamp(), -1);
        assert_eq!(instant.nanosecond(), 999_999_999);
    }

    #[test]
    fn rfc3339_text_round_trips_exact_instant() {
        let instant = LogTimestamp::from_nanos(1_500).to_utc().expect("utc");
        let text = format_rfc3339(instant).expect("format");
        assert!(text.starts_with("1970-01-01T00:00:00.0000015"));
        assert_eq!(parse_rfc3339(&text).expect("parse"), instant);
    }
}
