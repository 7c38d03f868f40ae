// crates/telemetry-ingest-core/src/runtime/registrar.rs
// ============================================================================
// Module: Telemetry Ingest Run Registrar
// Description: Pre-scan of a log and creation of its parent run record.
// Purpose: Guarantee the run exists before any fact references it.
// Dependencies: crate::{core, interfaces, runtime::pipeline}
// ============================================================================

//! ## Overview
//! Registration is the first of two passes over a log. The pre-scan reads
//! every record to find the first-read and last-read timestamps, derives the
//! run name and type from the log path, and inserts the run row. A log with
//! no records has no start time: registration fails and no run is created.
//! A read error during the pre-scan also fails registration, since the
//! bounds would be incomplete.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path;

use crate::core::BoundsTracker;
use crate::core::NewRun;
use crate::core::RunBounds;
use crate::core::RunId;
use crate::core::RunTypeRules;
use crate::core::run_name_from_path;
use crate::interfaces::LogError;
use crate::interfaces::LogOpener;
use crate::interfaces::MessageLog;
use crate::interfaces::RunCatalog;
use crate::runtime::pipeline::IngestError;
use crate::runtime::pipeline::IngestRequest;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRegistration {
    /// Generated run identifier.
    pub run_id: RunId,
    /// Run row as inserted.
    pub run: NewRun,
    /// Bounds discovered by the pre-scan.
    pub bounds: RunBounds,
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Reads every record once and returns the session bounds.
///
/// Returns `Ok(None)` when the log holds no records.
///
/// # Errors
///
/// Returns [`LogError`] when the sequence cannot be taken or a record fails
/// to read.
pub fn scan_bounds(log: &mut dyn MessageLog) -> Result<Option<RunBounds>, LogError> {
    let mut tracker = BoundsTracker::new();
    for record in log.messages()? {
        tracker.observe(record?.timestamp);
    }
    Ok(tracker.finish())
}

/// Builds the run row for a request from its bounds.
///
/// # Errors
///
/// Returns [`IngestError::Log`] when a bound cannot be represented as a UTC
/// instant or the log path cannot be made absolute.
pub fn describe_run(
    request: &IngestRequest,
    bounds: &RunBounds,
    rules: &RunTypeRules,
) -> Result<NewRun, IngestError> {
    let run_name = run_name_from_path(&request.log_path);
    let run_type = rules.classify(&run_name).to_string();
    let start_time =
        bounds.first.to_utc().map_err(|err| IngestError::Log(LogError::Format(err.to_string())))?;
    let end_time = bounds.last.to_utc().ok();
    let log_path = path::absolute(&request.log_path)
        .map_err(|err| IngestError::Log(LogError::Io(err.to_string())))?
        .display()
        .to_string();
    Ok(NewRun {
        run_name,
        start_time,
        end_time,
        slam_type: request.slam_type.clone(),
        log_path,
        run_type,
        doc_url: request.doc_url.clone(),
    })
}

/// Pre-scans the log and inserts the run row.
///
/// # Errors
///
/// Returns [`IngestError::Log`] when the log cannot be opened or read,
/// [`IngestError::EmptyLog`] when it has no records, and
/// [`IngestError::Catalog`] when the run row cannot be inserted.
pub fn register_run<O, C>(
    opener: &O,
    catalog: &C,
    rules: &RunTypeRules,
    request: &IngestRequest,
) -> Result<RunRegistration, IngestError>
where
    O: LogOpener + ?Sized,
    C: RunCatalog + ?Sized,
{
    let mut log = opener.open(&request.log_path).map_err(IngestError::Log)?;
    let bounds = scan_bounds(log.as_mut())
        .map_err(IngestError::Log)?
        .ok_or_else(|| IngestError::EmptyLog(request.log_path.display().to_string()))?;
    let run = describe_run(request, &bounds, rules)?;
    let run_id = catalog.create_run(&run).map_err(IngestError::Catalog)?;
    Ok(RunRegistration {
        run_id,
        run,
        bounds,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
