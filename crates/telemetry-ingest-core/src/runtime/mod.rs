// crates/telemetry-ingest-core/src/runtime/mod.rs
// ============================================================================
// Module: Telemetry Ingest Runtime
// Description: Log readers, registry, registrar, dispatcher, and pipeline.
// Purpose: Execute ingestion jobs against the core interfaces.
// Dependencies: crate::{core, interfaces, messages, transform}
// ============================================================================

//! ## Overview
//! Runtime modules wire the interfaces together. The pipeline is
//! single-threaded and synchronous: each record is read, routed, transformed,
//! and written before the next one is read.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod dispatcher;
pub mod events;
pub mod pipeline;
pub mod reader;
pub mod registrar;
pub mod registry;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dispatcher::DispatchSummary;
pub use dispatcher::Dispatcher;
pub use events::EventLevel;
pub use events::FileEventSink;
pub use events::IngestEvent;
pub use events::IngestEventSink;
pub use events::MemoryEventSink;
pub use events::StderrEventSink;
pub use pipeline::IngestError;
pub use pipeline::IngestPipeline;
pub use pipeline::IngestReport;
pub use pipeline::IngestRequest;
pub use reader::McapLog;
pub use reader::McapOpener;
pub use reader::MemoryLog;
pub use reader::MemoryLogOpener;
pub use registrar::RunRegistration;
pub use registrar::register_run;
pub use registrar::scan_bounds;
pub use registry::RegistryError;
pub use registry::SchemaRegistry;
pub use registry::TopicRoute;
pub use store::InMemoryFactStore;
