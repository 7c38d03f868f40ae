// crates/telemetry-ingest-core/src/core/mod.rs
// ============================================================================
// Module: Telemetry Ingest Core Types
// Description: Identifiers, time, run, and fact model for ingestion.
// Purpose: Provide the typed vocabulary shared by transformers and sinks.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types describe what an ingestion job persists: one run record and the
//! fact rows that reference it. They carry no I/O and are shared by every
//! persistence backend.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod fact;
pub mod identifiers;
pub mod run;
pub mod sql;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fact::ColumnValue;
pub use fact::ConflictPolicies;
pub use fact::ConflictPolicy;
pub use fact::FactKey;
pub use fact::FactTable;
pub use fact::ReferenceTable;
pub use fact::WriteOutcome;
pub use fact::WriteRequest;
pub use fact::WriteRequestError;
pub use identifiers::RunId;
pub use identifiers::TopicName;
pub use run::BoundsTracker;
pub use run::NewRun;
pub use run::RunBounds;
pub use run::RunTypeRule;
pub use run::RunTypeRules;
pub use run::UNKNOWN_RUN_TYPE;
pub use run::run_name_from_path;
pub use sql::Placeholder;
pub use sql::upsert_statement;
pub use self::time::LogTimestamp;
pub use self::time::TimeError;
pub use self::time::format_rfc3339;
pub use self::time::parse_rfc3339;
