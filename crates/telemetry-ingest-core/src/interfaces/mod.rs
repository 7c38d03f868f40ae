// crates/telemetry-ingest-core/src/interfaces/mod.rs
// ============================================================================
// Module: Telemetry Ingest Interfaces
// Description: Backend-agnostic interfaces for log reading and persistence.
// Purpose: Define the contract surfaces used by the ingestion runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime reads recorded sessions through [`LogOpener`] and
//! [`MessageLog`], and persists through [`RunCatalog`] and [`FactSink`].
//! Concrete backends live outside the core; implementations must write each
//! row atomically and fail closed on invalid requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use thiserror::Error;

use crate::core::LogTimestamp;
use crate::core::NewRun;
use crate::core::RunId;
use crate::core::TopicName;
use crate::core::WriteOutcome;
use crate::core::WriteRequest;
use crate::core::WriteRequestError;

// ============================================================================
// SECTION: Message Log
// ============================================================================

/// One record read from a recorded session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Channel topic.
    pub topic: TopicName,
    /// Type descriptor of the channel schema, when recorded.
    pub type_name: Option<String>,
    /// Serialized payload.
    pub payload: Vec<u8>,
    /// Record log time.
    pub timestamp: LogTimestamp,
}

/// Log reading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// Log path does not exist.
    #[error("log not found: {0}")]
    NotFound(String),
    /// Log could not be read.
    #[error("log io error: {0}")]
    Io(String),
    /// Log content is not a valid container.
    #[error("log format error: {0}")]
    Format(String),
    /// Log was already read once.
    #[error("log exhausted: {0}")]
    Exhausted(String),
}

/// Iterator over log records in physical order.
pub type LogRecords<'a> = Box<dyn Iterator<Item = Result<LogRecord, LogError>> + 'a>;

/// Opened recorded session.
///
/// # Invariants
/// - Records are produced lazily, once, in physical storage order.
/// - An error item ends the sequence.
pub trait MessageLog {
    /// Returns the record sequence.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Exhausted`] when the sequence was already taken;
    /// re-reading requires reopening the log.
    fn messages(&mut self) -> Result<LogRecords<'_>, LogError>;
}

/// Opens recorded sessions by path.
pub trait LogOpener {
    /// Opens the log at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::NotFound`] or [`LogError::Format`] when the log is
    /// missing or unparseable.
    fn open(&self, path: &Path) -> Result<Box<dyn MessageLog>, LogError>;
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Storage I/O failure.
    #[error("sink io error: {0}")]
    Io(String),
    /// Database reported an error.
    #[error("sink database error: {0}")]
    Db(String),
    /// Row violates a constraint, such as a missing parent run.
    #[error("sink integrity violation: {0}")]
    Integrity(String),
    /// Request is malformed and was rejected before storage.
    #[error("invalid write request: {0}")]
    Invalid(String),
    /// Sink is no longer usable.
    #[error("sink closed: {0}")]
    Closed(String),
}

impl From<WriteRequestError> for SinkError {
    fn from(err: WriteRequestError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Creates parent run records.
pub trait RunCatalog {
    /// Inserts a run and returns its generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the run cannot be inserted.
    fn create_run(&self, run: &NewRun) -> Result<RunId, SinkError>;
}

/// Time-series fact sink with per-table conflict policies.
pub trait FactSink {
    /// Upserts one full fact row in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Invalid`] before touching storage when the
    /// request does not match its table, and [`SinkError::Integrity`] when
    /// the referenced run does not exist.
    fn upsert(&self, request: &WriteRequest) -> Result<WriteOutcome, SinkError>;
}
