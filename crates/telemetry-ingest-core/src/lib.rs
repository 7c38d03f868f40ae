// crates/telemetry-ingest-core/src/lib.rs
// ============================================================================
// Module: Telemetry Ingest Core Library
// Description: Public API surface for the telemetry ingestion core.
// Purpose: Expose the data model, decoders, transformers, and runtime.
// Dependencies: crate::{core, interfaces, messages, runtime, transform}
// ============================================================================

//! ## Overview
//! Telemetry ingest replays a recorded vehicle session and persists derived
//! subsystem metrics into a time-indexed store, scoped to one run. The core
//! is backend-agnostic: it reads logs through [`LogOpener`] and persists
//! through [`RunCatalog`] and [`FactSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod messages;
pub mod runtime;
pub mod transform;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::FactSink;
pub use interfaces::LogError;
pub use interfaces::LogOpener;
pub use interfaces::LogRecord;
pub use interfaces::LogRecords;
pub use interfaces::MessageLog;
pub use interfaces::RunCatalog;
pub use interfaces::SinkError;
pub use messages::DecodeError;
pub use messages::DecodedMessage;
pub use messages::MessageKind;
pub use runtime::DispatchSummary;
pub use runtime::EventLevel;
pub use runtime::FileEventSink;
pub use runtime::InMemoryFactStore;
pub use runtime::IngestError;
pub use runtime::IngestEvent;
pub use runtime::IngestEventSink;
pub use runtime::IngestPipeline;
pub use runtime::IngestReport;
pub use runtime::IngestRequest;
pub use runtime::McapOpener;
pub use runtime::MemoryEventSink;
pub use runtime::MemoryLogOpener;
pub use runtime::SchemaRegistry;
pub use runtime::StderrEventSink;
pub use transform::ExtractionError;
pub use transform::Transformer;
