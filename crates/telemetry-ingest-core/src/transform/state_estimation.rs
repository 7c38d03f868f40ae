// crates/telemetry-ingest-core/src/transform/state_estimation.rs
// ============================================================================
// Module: State Estimation Transformers
// Description: Filter step timing and estimated vehicle state.
// Purpose: Emit rows into the state-estimation tables.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! State estimation reports the execution time of its correction and
//! prediction steps as metric rows, and its pose estimate as one full row in
//! `state_estimation_state`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ColumnValue;
use crate::core::FactTable;
use crate::core::LogTimestamp;
use crate::core::RunId;
use crate::core::WriteRequest;
use crate::messages::DecodedMessage;
use crate::transform::ExtractionError;
use crate::transform::Transformer;
use crate::transform::fact_time;
use crate::transform::unexpected;

// ============================================================================
// SECTION: Step Timing
// ============================================================================

/// Filter step timing topics (`Float64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEstimationTimingTransformer {
    /// Correction step execution time.
    CorrectionStep,
    /// Prediction step execution time.
    PredictionStep,
}

impl StateEstimationTimingTransformer {
    /// Returns the metric name written for this topic.
    #[must_use]
    pub const fn metric(self) -> &'static str {
        match self {
            Self::CorrectionStep => "correction_step",
            Self::PredictionStep => "prediction_step",
        }
    }
}

impl Transformer for StateEstimationTimingTransformer {
    fn name(&self) -> &'static str {
        "state_estimation_timing"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let DecodedMessage::Float64(value) = message else {
            return Err(unexpected(self.name(), message));
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::metric(
            FactTable::StateEstimationPredCorr,
            time,
            run_id,
            self.metric(),
            *value,
        )])
    }
}

// ============================================================================
// SECTION: Vehicle State
// ============================================================================

/// Vehicle pose estimate (`VehicleState`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleStateTransformer;

impl Transformer for VehicleStateTransformer {
    fn name(&self) -> &'static str {
        "vehicle_state"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let DecodedMessage::VehicleState(state) = message else {
            return Err(unexpected(self.name(), message));
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::row(
            FactTable::StateEstimationState,
            time,
            run_id,
            vec![
                ColumnValue::new("x", state.position.x),
                ColumnValue::new("y", state.position.y),
                ColumnValue::new("theta", state.theta),
                ColumnValue::new("linear_velocity", state.linear_velocity),
                ColumnValue::new("angular_velocity", state.angular_velocity),
            ],
        )])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;
    use crate::messages::Header;
    use crate::messages::Vector3;
    use crate::messages::VehicleState;

    #[test]
    fn vehicle_state_fills_every_state_column() {
        let message = DecodedMessage::VehicleState(VehicleState {
            header: Header {
                sec: 0,
                nanosec: 0,
                frame_id: "map".to_string(),
            },
            position: Vector3 {
                x: 1.0,
                y: 2.0,
                z: 9.0,
            },
            theta: 0.3,
            linear_velocity: 4.0,
            angular_velocity: 0.1,
        });
        let requests =
            VehicleStateTransformer.transform(&message, RunId::new(1), LogTimestamp::from_nanos(5)).expect("rows");
        assert_eq!(requests[0].table, FactTable::StateEstimationState);
        assert_eq!(requests[0].ordered_values().expect("valid"), vec![1.0, 2.0, 0.3, 4.0, 0.1]);
    }

    #[test]
    fn prediction_step_is_metric_keyed() {
        let requests = StateEstimationTimingTransformer::PredictionStep
            .transform(&DecodedMessage::Float64(0.02), RunId::new(1), LogTimestamp::from_nanos(5))
            .expect("rows");
        assert_eq!(requests[0].key.metric, Some("prediction_step"));
        assert_eq!(requests[0].table, FactTable::StateEstimationPredCorr);
    }
}
