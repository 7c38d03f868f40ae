// crates/telemetry-ingest-core/tests/ingest_pipeline.rs
// ============================================================================
// Module: Ingest Pipeline Tests
// Description: End-to-end ingestion over in-memory logs and store.
// Purpose: Validate registration, routing, fault isolation, and conflict policy.
// Dependencies: telemetry-ingest-core
// ============================================================================

//! ## Overview
//! Drives [`IngestPipeline`] and [`Dispatcher`] over in-memory logs and the
//! in-memory fact store, observing effects through store counters and the
//! memory event sink.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use common::control_command;
use common::evaluator;
use common::float64;
use common::foreign_record;
use common::record;
use common::session;
use telemetry_ingest_core::ConflictPolicies;
use telemetry_ingest_core::ConflictPolicy;
use telemetry_ingest_core::FactKey;
use telemetry_ingest_core::FactSink;
use telemetry_ingest_core::FactTable;
use telemetry_ingest_core::InMemoryFactStore;
use telemetry_ingest_core::IngestError;
use telemetry_ingest_core::IngestPipeline;
use telemetry_ingest_core::IngestRequest;
use telemetry_ingest_core::LogError;
use telemetry_ingest_core::LogRecord;
use telemetry_ingest_core::LogTimestamp;
use telemetry_ingest_core::MemoryEventSink;
use telemetry_ingest_core::MemoryLogOpener;
use telemetry_ingest_core::MessageKind;
use telemetry_ingest_core::NewRun;
use telemetry_ingest_core::RunCatalog;
use telemetry_ingest_core::RunId;
use telemetry_ingest_core::RunTypeRule;
use telemetry_ingest_core::RunTypeRules;
use telemetry_ingest_core::SchemaRegistry;
use telemetry_ingest_core::SinkError;
use telemetry_ingest_core::WriteOutcome;
use telemetry_ingest_core::WriteRequest;
use telemetry_ingest_core::runtime::Dispatcher;
use telemetry_ingest_core::runtime::MemoryLog;
use telemetry_ingest_core::runtime::events::EVENT_FACT_IGNORED;
use telemetry_ingest_core::runtime::events::EVENT_FACT_WRITTEN;
use telemetry_ingest_core::runtime::events::EVENT_INGEST_ABORTED;
use telemetry_ingest_core::runtime::events::EVENT_INGEST_FINISHED;
use telemetry_ingest_core::runtime::events::EVENT_MESSAGE_DROPPED;
use telemetry_ingest_core::runtime::events::EVENT_READ_FAILED;
use telemetry_ingest_core::runtime::events::EVENT_RUN_REGISTERED;
use telemetry_ingest_core::runtime::events::EVENT_WRITE_FAILED;
use telemetry_ingest_core::runtime::events::EventLevel;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Base log time: 2023-11-14T22:13:20Z.
const BASE: i64 = 1_700_000_000_000_000_000;

/// Pipeline over in-memory logs with a recording event sink.
type MemoryPipeline<S> = IngestPipeline<MemoryLogOpener, S, Arc<MemoryEventSink>>;

fn pipeline_with<S>(path: &str, records: Vec<LogRecord>, store: S) -> (MemoryPipeline<S>, Arc<MemoryEventSink>)
where
    S: RunCatalog + FactSink,
{
    let events = Arc::new(MemoryEventSink::default());
    let opener = MemoryLogOpener::new().with_log(path, records);
    let registry = SchemaRegistry::vehicle_default().expect("registry");
    (IngestPipeline::new(opener, store, Arc::clone(&events), registry), events)
}

fn pipeline(path: &str, records: Vec<LogRecord>) -> (MemoryPipeline<InMemoryFactStore>, Arc<MemoryEventSink>) {
    pipeline_with(path, records, InMemoryFactStore::new())
}

fn key(nanos: i64, run_id: RunId, metric: Option<&'static str>) -> FactKey {
    FactKey {
        time: LogTimestamp::from_nanos(nanos).to_utc().expect("utc"),
        run_id,
        metric,
    }
}

/// Store wrapper that rejects every write to one table.
struct RejectingStore {
    /// Backing store for accepted writes.
    inner: InMemoryFactStore,
    /// Table whose writes fail.
    rejected: FactTable,
}

impl RunCatalog for RejectingStore {
    fn create_run(&self, run: &NewRun) -> Result<RunId, SinkError> {
        self.inner.create_run(run)
    }
}

impl FactSink for RejectingStore {
    fn upsert(&self, request: &WriteRequest) -> Result<WriteOutcome, SinkError> {
        if request.table == self.rejected {
            return Err(SinkError::Integrity(format!("{} rejected", request.table)));
        }
        self.inner.upsert(request)
    }
}

/// Catalog that cannot insert runs.
struct ClosedCatalog;

impl RunCatalog for ClosedCatalog {
    fn create_run(&self, _run: &NewRun) -> Result<RunId, SinkError> {
        Err(SinkError::Closed("catalog offline".to_string()))
    }
}

impl FactSink for ClosedCatalog {
    fn upsert(&self, _request: &WriteRequest) -> Result<WriteOutcome, SinkError> {
        panic!("no fact may be written without a run");
    }
}

// ============================================================================
// SECTION: Full Session
// ============================================================================

#[test]
fn session_populates_every_registered_family() {
    let (pipeline, events) = pipeline("/logs/Hard_Course_2024.mcap", session(BASE));
    let report = pipeline.run(&IngestRequest::new("/logs/Hard_Course_2024.mcap")).expect("ingest");

    assert_eq!(report.run_name, "Hard_Course_2024");
    assert_eq!(report.run_type, "Hard Course");
    assert_eq!(report.dispatch.messages_read, 20);
    assert_eq!(report.dispatch.messages_skipped, 1);
    assert_eq!(report.dispatch.messages_dropped, 0);
    assert_eq!(report.dispatch.facts_written, 19);
    assert_eq!(report.dispatch.read_error, None);

    let store = pipeline.store();
    let expected_rows = [
        (FactTable::Perception, 2),
        (FactTable::StateEstimationPredCorr, 2),
        (FactTable::StateEstimationState, 1),
        (FactTable::StateEstimationMap, 0),
        (FactTable::Planning, 5),
        (FactTable::Control, 1),
        (FactTable::ControlMetrics, 1),
        (FactTable::SensorData, 3),
        (FactTable::ImuAcceleration, 1),
        (FactTable::ImuAngularVelocity, 1),
        (FactTable::ImuEulerAngles, 1),
        (FactTable::ImuQuaternion, 1),
    ];
    assert_eq!(expected_rows.len(), FactTable::ALL.len());
    for (table, rows) in expected_rows {
        assert_eq!(store.fact_count(table).expect("count"), rows, "{table}");
    }

    let metrics: [(FactTable, i64, &'static str, f64); 12] = [
        (FactTable::Perception, 0, "execution_time", 0.012),
        (FactTable::Perception, 1, "num_cones", 14.0),
        (FactTable::StateEstimationPredCorr, 2, "correction_step", 0.002),
        (FactTable::StateEstimationPredCorr, 3, "prediction_step", 0.001),
        (FactTable::Planning, 5, "execution_time", 0.03),
        (FactTable::Planning, 6, "num_yellow_cones", 6.0),
        (FactTable::Planning, 7, "num_blue_cones", 5.0),
        (FactTable::Planning, 8, "num_removed_yellow_cones", 2.0),
        (FactTable::Planning, 9, "num_removed_blue_cones", 1.0),
        (FactTable::SensorData, 12, "rl_rpm", 820.0),
        (FactTable::SensorData, 13, "rr_rpm", 815.0),
        (FactTable::SensorData, 14, "steering_angle", 0.05),
    ];
    for (table, offset, metric, value) in metrics {
        let stored = store.fact(table, &key(BASE + offset, report.run_id, Some(metric))).expect("read");
        assert_eq!(stored, Some(vec![value]), "{table}.{metric}");
    }

    let rows: [(FactTable, i64, Vec<f64>); 7] = [
        (FactTable::StateEstimationState, 4, vec![1.0, 2.0, 0.1, 3.0, 0.2]),
        (FactTable::ControlMetrics, 10, vec![1.0, 1.5, 0.5, 0.7, 4.0, 3.5, 0.004]),
        (FactTable::Control, 11, vec![0.6, -0.1]),
        (FactTable::ImuAcceleration, 15, vec![0.1, 0.0, 9.8]),
        (FactTable::ImuAngularVelocity, 16, vec![0.0, 0.02, 0.3]),
        (FactTable::ImuEulerAngles, 17, vec![0.01, -0.02, 1.57]),
        (FactTable::ImuQuaternion, 18, vec![0.0, 0.0, 0.0, 1.0]),
    ];
    for (table, offset, values) in rows {
        let stored = store.fact(table, &key(BASE + offset, report.run_id, None)).expect("read");
        assert_eq!(stored, Some(values), "{table}");
    }

    assert_eq!(events.named(EVENT_RUN_REGISTERED).len(), 1);
    assert_eq!(events.named(EVENT_FACT_WRITTEN).len(), 19);
    assert_eq!(events.named(EVENT_INGEST_FINISHED).len(), 1);
    assert!(events.named(EVENT_MESSAGE_DROPPED).is_empty());
}

#[test]
fn run_row_spans_first_and_last_read() {
    let records = vec![
        record("/perception/execution_time", MessageKind::Float64, float64(0.1), 100),
        record("/perception/execution_time", MessageKind::Float64, float64(0.2), 500),
        record("/perception/execution_time", MessageKind::Float64, float64(0.3), 250),
    ];
    let (pipeline, _events) = pipeline("/logs/Unlabeled_Test.mcap", records);
    let report = pipeline.run(&IngestRequest::new("/logs/Unlabeled_Test.mcap")).expect("ingest");
    assert_eq!(report.run_type, "Unknown");

    let run = pipeline.store().run(report.run_id).expect("read").expect("run");
    assert_eq!(run.start_time, LogTimestamp::from_nanos(100).to_utc().expect("utc"));
    assert_eq!(run.end_time, Some(LogTimestamp::from_nanos(250).to_utc().expect("utc")));
    assert_eq!(run.run_type, "Unknown");
}

#[test]
fn custom_run_types_replace_builtin_rules() {
    let (pipeline, _events) = pipeline(
        "/logs/Skidpad_03.mcap",
        vec![record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE)],
    );
    let pipeline = pipeline.with_run_types(RunTypeRules::new(vec![RunTypeRule::new("Skidpad", "Skidpad")]));
    let report = pipeline.run(&IngestRequest::new("/logs/Skidpad_03.mcap")).expect("ingest");
    assert_eq!(report.run_type, "Skidpad");
}

// ============================================================================
// SECTION: Fatal Preconditions
// ============================================================================

#[test]
fn empty_log_fails_without_run_or_dispatch() {
    let (pipeline, events) = pipeline("/logs/empty.mcap", Vec::new());
    let err = pipeline.run(&IngestRequest::new("/logs/empty.mcap")).expect_err("empty log");
    assert!(matches!(err, IngestError::EmptyLog(_)));
    assert_eq!(pipeline.store().run_count().expect("count"), 0);
    assert_eq!(pipeline.store().total_facts().expect("count"), 0);
    assert!(events.named(EVENT_RUN_REGISTERED).is_empty());
    assert!(events.named(EVENT_INGEST_FINISHED).is_empty());
    let aborted = events.named(EVENT_INGEST_ABORTED);
    assert_eq!(aborted.len(), 1);
    assert_eq!(aborted[0].level, EventLevel::Error);
}

#[test]
fn missing_log_fails_with_not_found() {
    let (pipeline, _events) = pipeline("/logs/present.mcap", session(BASE));
    let err = pipeline.run(&IngestRequest::new("/logs/absent.mcap")).expect_err("missing log");
    assert!(matches!(err, IngestError::Log(LogError::NotFound(_))));
    assert_eq!(pipeline.store().run_count().expect("count"), 0);
}

#[test]
fn catalog_failure_aborts_before_any_fact() {
    let (pipeline, events) = pipeline_with("/logs/EBS_Test_1.mcap", session(BASE), ClosedCatalog);
    let err = pipeline.run(&IngestRequest::new("/logs/EBS_Test_1.mcap")).expect_err("catalog down");
    assert!(matches!(err, IngestError::Catalog(SinkError::Closed(_))));
    assert_eq!(events.named(EVENT_INGEST_ABORTED).len(), 1);
}

// ============================================================================
// SECTION: Routing and Fault Isolation
// ============================================================================

#[test]
fn unregistered_topic_has_no_side_effects() {
    let records = vec![
        foreign_record("/rosout", BASE),
        foreign_record("/tf", BASE + 1),
        record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE + 2),
    ];
    let (pipeline, events) = pipeline("/logs/Closed_Course_1.mcap", records);
    let report = pipeline.run(&IngestRequest::new("/logs/Closed_Course_1.mcap")).expect("ingest");
    assert_eq!(report.dispatch.messages_skipped, 2);
    assert_eq!(report.dispatch.facts_written, 1);
    assert!(events.events().iter().all(|event| event.level < EventLevel::Warn));
}

#[test]
fn malformed_registered_message_yields_one_warning() {
    let records = vec![
        record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE),
        record("/as_msgs/controls", MessageKind::ControlCommand, vec![0x00, 0x01, 0x00, 0x00, 0x01], BASE + 1),
        record("/as_msgs/controls", MessageKind::ControlCommand, control_command(0.5, 0.0), BASE + 2),
    ];
    let (pipeline, events) = pipeline("/logs/Hard_Course_9.mcap", records);
    let report = pipeline.run(&IngestRequest::new("/logs/Hard_Course_9.mcap")).expect("ingest");

    assert_eq!(report.dispatch.messages_dropped, 1);
    assert_eq!(report.dispatch.facts_written, 2);
    let dropped = events.named(EVENT_MESSAGE_DROPPED);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].level, EventLevel::Warn);
    assert_eq!(dropped[0].topic.as_ref().map(|topic| topic.as_str()), Some("/as_msgs/controls"));
    assert_eq!(dropped[0].log_time_ns, Some(LogTimestamp::from_nanos(BASE + 1)));

    let store = pipeline.store();
    assert!(store.fact(FactTable::Control, &key(BASE + 1, report.run_id, None)).expect("read").is_none());
    assert!(store.fact(FactTable::Control, &key(BASE + 2, report.run_id, None)).expect("read").is_some());
}

#[test]
fn type_descriptor_mismatch_drops_message() {
    let mut mislabeled = record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE);
    mislabeled.type_name = Some("std_msgs/msg/String".to_string());
    let (pipeline, events) = pipeline("/logs/x.mcap", vec![mislabeled]);
    let report = pipeline.run(&IngestRequest::new("/logs/x.mcap")).expect("ingest");
    assert_eq!(report.dispatch.messages_dropped, 1);
    assert_eq!(report.dispatch.facts_written, 0);
    assert_eq!(events.named(EVENT_MESSAGE_DROPPED).len(), 1);
}

#[test]
fn sink_rejection_drops_only_that_message() {
    let store = RejectingStore {
        inner: InMemoryFactStore::new(),
        rejected: FactTable::ImuAcceleration,
    };
    let (pipeline, events) = pipeline_with("/logs/EBS_Test_2.mcap", session(BASE), store);
    let report = pipeline.run(&IngestRequest::new("/logs/EBS_Test_2.mcap")).expect("ingest");

    assert_eq!(report.dispatch.writes_failed, 1);
    assert_eq!(report.dispatch.messages_dropped, 1);
    assert_eq!(report.dispatch.facts_written, 18);
    let failed = events.named(EVENT_WRITE_FAILED);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].table, Some(FactTable::ImuAcceleration));
    assert_eq!(pipeline.store().inner.fact_count(FactTable::ImuAcceleration).expect("count"), 0);
}

#[test]
fn read_failure_keeps_committed_facts() {
    let items = vec![
        Ok(record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE)),
        Ok(record("/perception/execution_time", MessageKind::Float64, float64(0.2), BASE + 1)),
        Err(LogError::Format("truncated record".to_string())),
    ];
    let events = Arc::new(MemoryEventSink::default());
    let registry = SchemaRegistry::vehicle_default().expect("registry");
    let store = InMemoryFactStore::new();
    let run_id = store
        .create_run(&NewRun {
            run_name: "partial".to_string(),
            start_time: LogTimestamp::from_nanos(BASE).to_utc().expect("utc"),
            end_time: None,
            slam_type: None,
            log_path: "/logs/partial.mcap".to_string(),
            run_type: "Unknown".to_string(),
            doc_url: None,
        })
        .expect("run");

    let dispatcher = Dispatcher::new(&registry, &store, events.as_ref());
    let summary = dispatcher.dispatch(&mut MemoryLog::from_items(items), run_id).expect("dispatch");
    assert_eq!(summary.messages_read, 2);
    assert_eq!(summary.facts_written, 2);
    assert!(summary.read_error.is_some());
    assert_eq!(store.fact_count(FactTable::Perception).expect("count"), 2);
    assert_eq!(events.named(EVENT_READ_FAILED).len(), 1);
}

// ============================================================================
// SECTION: Conflict Policies
// ============================================================================

#[test]
fn ignore_policy_keeps_first_payload() {
    let records = vec![
        record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE),
        record("/perception/execution_time", MessageKind::Float64, float64(0.9), BASE),
    ];
    let (pipeline, events) = pipeline("/logs/dup.mcap", records);
    let report = pipeline.run(&IngestRequest::new("/logs/dup.mcap")).expect("ingest");
    assert_eq!(report.dispatch.facts_written, 1);
    assert_eq!(report.dispatch.facts_ignored, 1);
    assert_eq!(events.named(EVENT_FACT_IGNORED).len(), 1);
    let stored = pipeline
        .store()
        .fact(FactTable::Perception, &key(BASE, report.run_id, Some("execution_time")))
        .expect("read")
        .expect("fact");
    assert_eq!(stored, vec![0.1]);
}

#[test]
fn overwrite_policy_keeps_latest_payload() {
    let records = vec![
        record("/control/evaluator_data", MessageKind::EvaluatorControlData, evaluator((1.0, 1.0), (0.0, 0.0), (2.0, 2.0), 0.01), BASE),
        record("/control/evaluator_data", MessageKind::EvaluatorControlData, evaluator((5.0, 6.0), (1.0, 2.0), (3.0, 4.0), 0.02), BASE),
    ];
    let (pipeline, _events) = pipeline("/logs/dup.mcap", records);
    let report = pipeline.run(&IngestRequest::new("/logs/dup.mcap")).expect("ingest");
    assert_eq!(report.dispatch.facts_written, 2);
    assert_eq!(report.dispatch.facts_ignored, 0);
    let stored = pipeline
        .store()
        .fact(FactTable::ControlMetrics, &key(BASE, report.run_id, None))
        .expect("read")
        .expect("fact");
    assert_eq!(stored, vec![5.0, 6.0, 1.0, 2.0, 3.0, 4.0, 0.02]);
}

#[test]
fn configured_policy_overrides_default() {
    let records = vec![
        record("/perception/execution_time", MessageKind::Float64, float64(0.1), BASE),
        record("/perception/execution_time", MessageKind::Float64, float64(0.9), BASE),
    ];
    let store = InMemoryFactStore::with_policies(
        ConflictPolicies::new().with_override(FactTable::Perception, ConflictPolicy::Overwrite),
    );
    let (pipeline, _events) = pipeline_with("/logs/dup.mcap", records, store);
    let report = pipeline.run(&IngestRequest::new("/logs/dup.mcap")).expect("ingest");
    let stored = pipeline
        .store()
        .fact(FactTable::Perception, &key(BASE, report.run_id, Some("execution_time")))
        .expect("read")
        .expect("fact");
    assert_eq!(stored, vec![0.9]);
}

#[test]
fn replaying_a_run_adds_no_rows() {
    let registry = SchemaRegistry::vehicle_default().expect("registry");
    let events = MemoryEventSink::default();
    let store = InMemoryFactStore::new();
    let run_id = store
        .create_run(&NewRun {
            run_name: "replay".to_string(),
            start_time: LogTimestamp::from_nanos(BASE).to_utc().expect("utc"),
            end_time: None,
            slam_type: None,
            log_path: "/logs/replay.mcap".to_string(),
            run_type: "Unknown".to_string(),
            doc_url: None,
        })
        .expect("run");
    let dispatcher = Dispatcher::new(&registry, &store, &events);

    let first = dispatcher.dispatch(&mut MemoryLog::new(session(BASE)), run_id).expect("first");
    let rows = store.total_facts().expect("count");
    let second = dispatcher.dispatch(&mut MemoryLog::new(session(BASE)), run_id).expect("second");

    assert_eq!(first.facts_written, 19);
    assert_eq!(store.total_facts().expect("count"), rows);
    assert_eq!(second.facts_written, 1, "only control_metrics overwrites");
    assert_eq!(second.facts_ignored, 18);
    assert_eq!(second.messages_dropped, 0);
}
