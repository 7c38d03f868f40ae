// crates/telemetry-ingest-core/src/runtime/pipeline.rs
// ============================================================================
// Module: Telemetry Ingest Pipeline
// Description: Two-pass ingestion job over one recorded session.
// Purpose: Register the run, then dispatch every record into the store.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! An ingestion job opens the log twice. Pass one registers the run from the
//! pre-scanned bounds; pass two dispatches records into the fact sink. Only
//! three conditions fail the job, all before any fact is written: the log
//! cannot be opened, it holds no records (or the pre-scan fails), or the run
//! row cannot be inserted. Everything after registration is reported in the
//! [`IngestReport`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::RunId;
use crate::core::RunTypeRules;
use crate::interfaces::FactSink;
use crate::interfaces::LogError;
use crate::interfaces::LogOpener;
use crate::interfaces::RunCatalog;
use crate::interfaces::SinkError;
use crate::runtime::dispatcher::DispatchSummary;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::events::EVENT_INGEST_ABORTED;
use crate::runtime::events::EVENT_INGEST_FINISHED;
use crate::runtime::events::EVENT_RUN_REGISTERED;
use crate::runtime::events::EventLevel;
use crate::runtime::events::IngestEvent;
use crate::runtime::events::IngestEventSink;
use crate::runtime::registrar::register_run;
use crate::runtime::registry::SchemaRegistry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Ingestion job inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    /// Path of the recorded session.
    pub log_path: PathBuf,
    /// Optional SLAM configuration label.
    pub slam_type: Option<String>,
    /// Optional documentation link.
    pub doc_url: Option<String>,
}

impl IngestRequest {
    /// Creates a request without optional metadata.
    #[must_use]
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            slam_type: None,
            doc_url: None,
        }
    }
}

/// Completed ingestion job summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Run created for the job.
    pub run_id: RunId,
    /// Run name derived from the log path.
    pub run_name: String,
    /// Run type derived from the run name.
    pub run_type: String,
    /// Dispatch counters.
    #[serde(flatten)]
    pub dispatch: DispatchSummary,
}

/// Fatal ingestion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Log could not be opened or read.
    #[error("log unavailable: {0}")]
    Log(LogError),
    /// Log holds no records, so no start time exists.
    #[error("log has no messages: {0}")]
    EmptyLog(String),
    /// Run row could not be inserted.
    #[error("run registration failed: {0}")]
    Catalog(SinkError),
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Ingestion pipeline over a log opener, a store, and an event sink.
pub struct IngestPipeline<O, S, E> {
    /// Opens recorded sessions.
    opener: O,
    /// Run catalog and fact sink.
    store: S,
    /// Diagnostics sink.
    events: E,
    /// Topic routing table.
    registry: SchemaRegistry,
    /// Run type derivation rules.
    run_types: RunTypeRules,
}

impl<O, S, E> IngestPipeline<O, S, E>
where
    O: LogOpener,
    S: RunCatalog + FactSink,
    E: IngestEventSink,
{
    /// Creates a pipeline with the built-in run type rules.
    #[must_use]
    pub fn new(opener: O, store: S, events: E, registry: SchemaRegistry) -> Self {
        Self {
            opener,
            store,
            events,
            registry,
            run_types: RunTypeRules::default(),
        }
    }

    /// Replaces the run type rules.
    #[must_use]
    pub fn with_run_types(mut self, run_types: RunTypeRules) -> Self {
        self.run_types = run_types;
        self
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the event sink.
    #[must_use]
    pub const fn events(&self) -> &E {
        &self.events
    }

    /// Runs one ingestion job.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when the log cannot be opened, holds no
    /// records, or the run cannot be registered. No fact is written in
    /// those cases.
    pub fn run(&self, request: &IngestRequest) -> Result<IngestReport, IngestError> {
        let registration = register_run(&self.opener, &self.store, &self.run_types, request)
            .inspect_err(|err| self.abort(request, err))?;
        let run_id = registration.run_id;
        self.events.record(
            &IngestEvent::new(EVENT_RUN_REGISTERED, EventLevel::Info).with_run(run_id).with_message(format!(
                "{} ({}) spanning {} to {} over {} messages",
                registration.run.run_name,
                registration.run.run_type,
                registration.bounds.first,
                registration.bounds.last,
                registration.bounds.message_count
            )),
        );

        let dispatcher = Dispatcher::new(&self.registry, &self.store, &self.events);
        let mut log = self.opener.open(&request.log_path).map_err(IngestError::Log).inspect_err(|err| {
            self.abort(request, err);
        })?;
        let dispatch = dispatcher.dispatch(log.as_mut(), run_id).map_err(IngestError::Log).inspect_err(|err| {
            self.abort(request, err);
        })?;

        self.events.record(
            &IngestEvent::new(EVENT_INGEST_FINISHED, EventLevel::Info).with_run(run_id).with_message(format!(
                "read {}, skipped {}, dropped {}, written {}, ignored {}, failed writes {}",
                dispatch.messages_read,
                dispatch.messages_skipped,
                dispatch.messages_dropped,
                dispatch.facts_written,
                dispatch.facts_ignored,
                dispatch.writes_failed
            )),
        );
        Ok(IngestReport {
            run_id,
            run_name: registration.run.run_name,
            run_type: registration.run.run_type,
            dispatch,
        })
    }

    /// Records a fatal job error.
    fn abort(&self, request: &IngestRequest, err: &IngestError) {
        self.events.record(
            &IngestEvent::new(EVENT_INGEST_ABORTED, EventLevel::Error)
                .with_message(format!("{}: {err}", request.log_path.display())),
        );
    }
}
