// crates/telemetry-ingest-core/src/core/identifiers.rs
// ============================================================================
// Module: Telemetry Ingest Identifiers
// Description: Strongly typed identifiers for runs and log topics.
// Purpose: Keep run ids and topic names from being mixed with plain values.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Run identifiers are generated by the persistence layer when the parent run
//! row is inserted, so they wrap the store's integer key. Topic names are the
//! channel names found in a recorded log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identifier of a persisted run, generated by the run catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(i64);

impl RunId {
    /// Wraps a raw store key.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for RunId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

/// Channel name identifying a category of message in a recorded log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicName(String);

impl TopicName {
    /// Creates a new topic name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the topic name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TopicName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TopicName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
