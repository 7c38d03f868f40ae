// crates/telemetry-ingest-config/src/lib.rs
// ============================================================================
// Module: Telemetry Ingest Config Library
// Description: Configuration model and validation for ingestion jobs.
// Purpose: Single source of truth for telemetry-ingest.toml semantics.
// Dependencies: telemetry-ingest-core, telemetry-ingest-store-*, serde, toml
// ============================================================================

//! ## Overview
//! `telemetry-ingest-config` defines the configuration model for ingestion
//! jobs: which store receives facts, where events go, how runs are
//! classified, and which conflict policy each fact table uses. Validation is
//! strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
