// crates/telemetry-ingest-core/src/transform/mod.rs
// ============================================================================
// Module: Telemetry Ingest Transformers
// Description: Per-subsystem conversion of decoded messages into fact rows.
// Purpose: Map typed messages onto write requests for the time-series sink.
// Dependencies: crate::{core, messages}, thiserror
// ============================================================================

//! ## Overview
//! A transformer is a pure function of `(decoded message, run id, log
//! timestamp)`. Each subsystem has one transformer type whose variants cover
//! exactly the message shapes that subsystem publishes; handing it any other
//! shape is an [`ExtractionError::UnexpectedShape`]. The log timestamp becomes
//! the fact's UTC key; header stamps inside payloads are not consulted.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod control;
pub mod imu;
pub mod perception;
pub mod planning;
pub mod sensor;
pub mod state_estimation;

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::OffsetDateTime;

use crate::core::LogTimestamp;
use crate::core::RunId;
use crate::core::WriteRequest;
use crate::messages::DecodedMessage;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use control::ControlCommandTransformer;
pub use control::ControlMetricsTransformer;
pub use imu::ImuTransformer;
pub use perception::PerceptionTransformer;
pub use planning::PlanningTransformer;
pub use sensor::SensorTransformer;
pub use state_estimation::StateEstimationTimingTransformer;
pub use state_estimation::VehicleStateTransformer;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Field extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Message shape is not one the transformer accepts.
    #[error("unexpected message shape: {0}")]
    UnexpectedShape(String),
    /// Log timestamp cannot be converted to a UTC instant.
    #[error("timestamp conversion failed: {0}")]
    Timestamp(String),
}

// ============================================================================
// SECTION: Transformer Trait
// ============================================================================

/// Converts one decoded message into fact writes.
pub trait Transformer: Send + Sync {
    /// Returns the transformer name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Produces the write requests for one message.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] when the message shape is not accepted or
    /// the timestamp cannot be converted.
    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError>;
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a log timestamp into the fact key instant.
pub(crate) fn fact_time(timestamp: LogTimestamp) -> Result<OffsetDateTime, ExtractionError> {
    timestamp.to_utc().map_err(|err| ExtractionError::Timestamp(err.to_string()))
}

/// Builds the error for a shape the transformer does not accept.
pub(crate) fn unexpected(transformer: &str, message: &DecodedMessage) -> ExtractionError {
    ExtractionError::UnexpectedShape(format!(
        "{transformer} does not accept {}",
        message.kind().type_name()
    ))
}

/// Converts an element count into a metric value.
pub(crate) fn count_value(count: usize) -> Result<f64, ExtractionError> {
    u32::try_from(count)
        .map(f64::from)
        .map_err(|_| ExtractionError::UnexpectedShape(format!("element count {count} out of range")))
}
