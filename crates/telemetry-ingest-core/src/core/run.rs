// crates/telemetry-ingest-core/src/core/run.rs
// ============================================================================
// Module: Telemetry Ingest Run Model
// Description: Run metadata, session bounds, and run-type classification.
// Purpose: Describe the parent record every persisted fact belongs to.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A run is one recorded session ingested as a unit. Its bounds come from a
//! full pre-scan of the log: the first timestamp read and the last timestamp
//! read, in physical order. The last-read value is kept even when an earlier
//! record carries a larger timestamp.
//!
//! Run types are derived from the log's base name with an ordered list of
//! prefix rules; the first matching prefix wins and no match yields
//! [`UNKNOWN_RUN_TYPE`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::time::LogTimestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Run type assigned when no prefix rule matches.
pub const UNKNOWN_RUN_TYPE: &str = "Unknown";

/// File extension stripped from log names when deriving the run name.
const LOG_EXTENSION: &str = ".mcap";

/// Built-in prefix rules, in match order.
const BUILTIN_RUN_TYPES: [(&str, &str); 4] = [
    ("Hard_Course", "Hard Course"),
    ("EBS_Test", "EBS Test"),
    ("Closed_Course", "Closed Course"),
    ("Aceleration", "Acceleration"),
];

// ============================================================================
// SECTION: Run Type Rules
// ============================================================================

/// Maps a log name prefix to a run type label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTypeRule {
    /// Prefix matched against the run name.
    pub prefix: String,
    /// Run type label stored on the run.
    pub label: String,
}

impl RunTypeRule {
    /// Creates a new prefix rule.
    #[must_use]
    pub fn new(prefix: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            label: label.into(),
        }
    }
}

/// Ordered prefix rules used to classify runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTypeRules {
    /// Rules in match order.
    rules: Vec<RunTypeRule>,
}

impl RunTypeRules {
    /// Creates a rule set that matches in the given order.
    #[must_use]
    pub const fn new(rules: Vec<RunTypeRule>) -> Self {
        Self {
            rules,
        }
    }

    /// Returns the rules in match order.
    #[must_use]
    pub fn rules(&self) -> &[RunTypeRule] {
        &self.rules
    }

    /// Returns the label of the first rule whose prefix starts the run name.
    #[must_use]
    pub fn classify(&self, run_name: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| run_name.starts_with(rule.prefix.as_str()))
            .map_or(UNKNOWN_RUN_TYPE, |rule| rule.label.as_str())
    }
}

impl Default for RunTypeRules {
    fn default() -> Self {
        Self::new(
            BUILTIN_RUN_TYPES
                .iter()
                .map(|(prefix, label)| RunTypeRule::new(*prefix, *label))
                .collect(),
        )
    }
}

// ============================================================================
// SECTION: Run Bounds
// ============================================================================

/// Session bounds discovered by the pre-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Timestamp of the first record read.
    pub first: LogTimestamp,
    /// Timestamp of the last record read.
    pub last: LogTimestamp,
    /// Number of records seen.
    pub message_count: u64,
}

/// Accumulates bounds while records stream past.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundsTracker {
    /// First timestamp observed.
    first: Option<LogTimestamp>,
    /// Most recent timestamp observed.
    last: Option<LogTimestamp>,
    /// Records observed so far.
    count: u64,
}

impl BoundsTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first: None,
            last: None,
            count: 0,
        }
    }

    /// Records one timestamp in read order.
    pub const fn observe(&mut self, timestamp: LogTimestamp) {
        if self.first.is_none() {
            self.first = Some(timestamp);
        }
        self.last = Some(timestamp);
        self.count = self.count.saturating_add(1);
    }

    /// Returns the bounds, or `None` when nothing was observed.
    #[must_use]
    pub const fn finish(self) -> Option<RunBounds> {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Some(RunBounds {
                first,
                last,
                message_count: self.count,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Run Records
// ============================================================================

/// Run row to be inserted by the run catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRun {
    /// Human-readable run name (log base name without extension).
    pub run_name: String,
    /// Start instant (first timestamp read).
    pub start_time: OffsetDateTime,
    /// End instant (last timestamp read) when determinable.
    pub end_time: Option<OffsetDateTime>,
    /// Optional SLAM configuration label.
    pub slam_type: Option<String>,
    /// Absolute path of the source log.
    pub log_path: String,
    /// Run type derived from the run name.
    pub run_type: String,
    /// Optional documentation link.
    pub doc_url: Option<String>,
}

/// Derives the run name from a log path.
#[must_use]
pub fn run_name_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned();
    match name.strip_suffix(LOG_EXTENSION) {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
