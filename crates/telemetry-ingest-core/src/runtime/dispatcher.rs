// crates/telemetry-ingest-core/src/runtime/dispatcher.rs
// ============================================================================
// Module: Telemetry Ingest Dispatcher
// Description: Routes log records through decoders, transformers, and sink.
// Purpose: Persist facts for one run while isolating per-message failures.
// Dependencies: crate::{core, interfaces, messages, runtime}
// ============================================================================

//! ## Overview
//! Dispatch is the second pass over a log. Records are handled one at a
//! time, fully written before the next is read:
//! - Unregistered topic: skipped with no event.
//! - Decode or extraction failure on a registered topic: one warning, message
//!   dropped.
//! - Sink rejection: one warning per failed write, message dropped, no retry.
//! - Read failure: logged, dispatch stops; committed facts stay valid.
//!
//! No single message can abort the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::RunId;
use crate::core::WriteOutcome;
use crate::interfaces::FactSink;
use crate::interfaces::LogError;
use crate::interfaces::LogRecord;
use crate::interfaces::MessageLog;
use crate::runtime::events::EVENT_FACT_IGNORED;
use crate::runtime::events::EVENT_FACT_WRITTEN;
use crate::runtime::events::EVENT_MESSAGE_DROPPED;
use crate::runtime::events::EVENT_READ_FAILED;
use crate::runtime::events::EVENT_WRITE_FAILED;
use crate::runtime::events::EventLevel;
use crate::runtime::events::IngestEvent;
use crate::runtime::events::IngestEventSink;
use crate::runtime::registry::SchemaRegistry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Counters accumulated over one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Records read from the log.
    pub messages_read: u64,
    /// Records on unregistered topics.
    pub messages_skipped: u64,
    /// Registered-topic records that produced no complete write.
    pub messages_dropped: u64,
    /// Rows inserted or replaced.
    pub facts_written: u64,
    /// Rows skipped by the ignore policy.
    pub facts_ignored: u64,
    /// Writes rejected by the sink.
    pub writes_failed: u64,
    /// Read error that ended dispatch early.
    pub read_error: Option<String>,
}

/// Dispatcher over a registry, a fact sink, and an event sink.
pub struct Dispatcher<'a, S: ?Sized, E: ?Sized> {
    /// Topic routing table.
    registry: &'a SchemaRegistry,
    /// Fact sink receiving write requests.
    sink: &'a S,
    /// Event sink receiving diagnostics.
    events: &'a E,
}

impl<'a, S, E> Dispatcher<'a, S, E>
where
    S: FactSink + ?Sized,
    E: IngestEventSink + ?Sized,
{
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(registry: &'a SchemaRegistry, sink: &'a S, events: &'a E) -> Self {
        Self {
            registry,
            sink,
            events,
        }
    }

    /// Dispatches every record of the log for a run.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] only when the record sequence cannot be taken at
    /// all; failures after that are counted in the summary.
    pub fn dispatch(&self, log: &mut dyn MessageLog, run_id: RunId) -> Result<DispatchSummary, LogError> {
        let mut summary = DispatchSummary::default();
        for item in log.messages()? {
            match item {
                Ok(record) => {
                    summary.messages_read = summary.messages_read.saturating_add(1);
                    self.dispatch_record(&record, run_id, &mut summary);
                }
                Err(err) => {
                    self.events.record(
                        &IngestEvent::new(EVENT_READ_FAILED, EventLevel::Error)
                            .with_run(run_id)
                            .with_message(err.to_string()),
                    );
                    summary.read_error = Some(err.to_string());
                    break;
                }
            }
        }
        Ok(summary)
    }

    /// Handles one record.
    fn dispatch_record(&self, record: &LogRecord, run_id: RunId, summary: &mut DispatchSummary) {
        let Some(route) = self.registry.route(&record.topic) else {
            summary.messages_skipped = summary.messages_skipped.saturating_add(1);
            return;
        };

        let requests = route
            .kind
            .decode(record.type_name.as_deref(), &record.payload)
            .map_err(|err| err.to_string())
            .and_then(|message| {
                route.transformer.transform(&message, run_id, record.timestamp).map_err(|err| err.to_string())
            });
        let requests = match requests {
            Ok(requests) => requests,
            Err(detail) => {
                summary.messages_dropped = summary.messages_dropped.saturating_add(1);
                self.events.record(
                    &IngestEvent::new(EVENT_MESSAGE_DROPPED, EventLevel::Warn)
                        .with_run(run_id)
                        .with_record(&record.topic, record.timestamp)
                        .with_message(detail),
                );
                return;
            }
        };

        let mut failed = false;
        for request in &requests {
            let event = match self.sink.upsert(request) {
                Ok(WriteOutcome::Written) => {
                    summary.facts_written = summary.facts_written.saturating_add(1);
                    IngestEvent::new(EVENT_FACT_WRITTEN, EventLevel::Debug)
                }
                Ok(WriteOutcome::Ignored) => {
                    summary.facts_ignored = summary.facts_ignored.saturating_add(1);
                    IngestEvent::new(EVENT_FACT_IGNORED, EventLevel::Debug)
                }
                Err(err) => {
                    failed = true;
                    summary.writes_failed = summary.writes_failed.saturating_add(1);
                    IngestEvent::new(EVENT_WRITE_FAILED, EventLevel::Warn).with_message(err.to_string())
                }
            };
            self.events.record(
                &event.with_run(run_id).with_record(&record.topic, record.timestamp).with_table(request.table),
            );
        }
        if failed {
            summary.messages_dropped = summary.messages_dropped.saturating_add(1);
        }
    }
}
