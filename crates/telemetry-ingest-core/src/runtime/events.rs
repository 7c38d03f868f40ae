// crates/telemetry-ingest-core/src/runtime/events.rs
// ============================================================================
// Module: Telemetry Ingest Events
// Description: Structured ingestion events and JSON-line sinks.
// Purpose: Report run registration, dropped messages, and write outcomes.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! The pipeline reports progress as structured events. Sinks serialize each
//! event as one JSON line and drop events below their minimum level. Events
//! are best effort: a sink that cannot write never fails ingestion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::core::FactTable;
use crate::core::LogTimestamp;
use crate::core::RunId;
use crate::core::TopicName;

// ============================================================================
// SECTION: Event Names
// ============================================================================

/// Run row inserted.
pub const EVENT_RUN_REGISTERED: &str = "run_registered";
/// Registered-topic message dropped after a decode or extraction failure.
pub const EVENT_MESSAGE_DROPPED: &str = "message_dropped";
/// Sink rejected a write.
pub const EVENT_WRITE_FAILED: &str = "write_failed";
/// Fact row inserted or replaced.
pub const EVENT_FACT_WRITTEN: &str = "fact_written";
/// Fact row skipped by the ignore policy.
pub const EVENT_FACT_IGNORED: &str = "fact_ignored";
/// Log read failed during dispatch.
pub const EVENT_READ_FAILED: &str = "read_failed";
/// Dispatch completed.
pub const EVENT_INGEST_FINISHED: &str = "ingest_finished";
/// Job aborted before dispatch.
pub const EVENT_INGEST_ABORTED: &str = "ingest_aborted";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Per-row detail.
    Debug,
    /// Job milestones.
    Info,
    /// Dropped data.
    Warn,
    /// Job failure.
    Error,
}

/// Ingestion event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event severity.
    pub level: EventLevel,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run identifier when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    /// Topic of the message involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<TopicName>,
    /// Log time of the message involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_time_ns: Option<LogTimestamp>,
    /// Fact table involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<FactTable>,
    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IngestEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(event: &'static str, level: EventLevel) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            level,
            timestamp_ms,
            run_id: None,
            topic: None,
            log_time_ns: None,
            table: None,
            message: None,
        }
    }

    /// Attaches the run identifier.
    #[must_use]
    pub const fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Attaches the message topic and log time.
    #[must_use]
    pub fn with_record(mut self, topic: &TopicName, timestamp: LogTimestamp) -> Self {
        self.topic = Some(topic.clone());
        self.log_time_ns = Some(timestamp);
        self
    }

    /// Attaches the fact table.
    #[must_use]
    pub const fn with_table(mut self, table: FactTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Attaches a detail message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for ingestion events.
pub trait IngestEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &IngestEvent);
}

impl<T: IngestEventSink + ?Sized> IngestEventSink for Box<T> {
    fn record(&self, event: &IngestEvent) {
        (**self).record(event);
    }
}

impl<T: IngestEventSink + ?Sized> IngestEventSink for Arc<T> {
    fn record(&self, event: &IngestEvent) {
        (**self).record(event);
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink that logs JSON lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StderrEventSink {
    /// Lowest level written.
    min_level: EventLevel,
}

impl StderrEventSink {
    /// Creates a stderr sink.
    #[must_use]
    pub const fn new(min_level: EventLevel) -> Self {
        Self {
            min_level,
        }
    }
}

impl IngestEventSink for StderrEventSink {
    fn record(&self, event: &IngestEvent) {
        if event.level >= self.min_level
            && let Ok(payload) = serde_json::to_string(event)
        {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
#[derive(Debug)]
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
    /// Lowest level written.
    min_level: EventLevel,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path, min_level: EventLevel) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            min_level,
        })
    }
}

impl IngestEventSink for FileEventSink {
    fn record(&self, event: &IngestEvent) {
        if event.level >= self.min_level
            && let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Event sink that keeps events in memory.
#[derive(Debug)]
pub struct MemoryEventSink {
    /// Recorded events.
    events: Mutex<Vec<IngestEvent>>,
    /// Lowest level kept.
    min_level: EventLevel,
}

impl Default for MemoryEventSink {
    fn default() -> Self {
        Self::new(EventLevel::Debug)
    }
}

impl MemoryEventSink {
    /// Creates a memory sink.
    #[must_use]
    pub const fn new(min_level: EventLevel) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            min_level,
        }
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<IngestEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the recorded events with the given name.
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<IngestEvent> {
        self.events().into_iter().filter(|event| event.event == name).collect()
    }
}

impl IngestEventSink for MemoryEventSink {
    fn record(&self, event: &IngestEvent) {
        if event.level >= self.min_level
            && let Ok(mut events) = self.events.lock()
        {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
