// crates/telemetry-ingest-store-postgres/src/lib.rs
// ============================================================================
// Module: Telemetry Ingest Postgres Store Library
// Description: Run catalog and fact sink on Postgres.
// Purpose: Persist runs and facts to a shared time-series database.
// Dependencies: telemetry-ingest-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! `telemetry-ingest-store-postgres` implements
//! [`telemetry_ingest_core::RunCatalog`] and [`telemetry_ingest_core::FactSink`]
//! over a connection pool built once per store. Fact tables can be provisioned
//! as `TimescaleDB` hypertables.

/// Postgres-backed run catalog and fact sink.
pub mod postgres_store;

pub use postgres_store::*;
