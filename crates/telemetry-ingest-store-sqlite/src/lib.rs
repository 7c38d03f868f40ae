// crates/telemetry-ingest-store-sqlite/src/lib.rs
// ============================================================================
// Module: Telemetry Ingest SQLite Store Library
// Description: Durable run catalog and fact sink on SQLite.
// Purpose: Persist runs and facts to a local database file.
// Dependencies: telemetry-ingest-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! `telemetry-ingest-store-sqlite` implements [`telemetry_ingest_core::RunCatalog`]
//! and [`telemetry_ingest_core::FactSink`] over a single `SQLite` connection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::*;
