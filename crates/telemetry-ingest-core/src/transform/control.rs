// crates/telemetry-ingest-core/src/transform/control.rs
// ============================================================================
// Module: Control Transformers
// Description: Controller evaluation samples and actuator commands.
// Purpose: Emit rows into the control and control_metrics tables.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! The controller evaluator publishes tracking metrics, written as one full
//! `control_metrics` row. Actuator commands land in `control`.

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
// SECTION: Control Metrics
// ============================================================================

/// Controller evaluation samples (`EvaluatorControlData`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlMetricsTransformer;

impl Transformer for ControlMetricsTransformer {
    fn name(&self) -> &'static str {
        "control_metrics"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let DecodedMessage::EvaluatorControlData(data) = message else {
            return Err(unexpected(self.name(), message));
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::row(
            FactTable::ControlMetrics,
            time,
            run_id,
            vec![
                ColumnValue::new("lookahead_x", data.lookahead_point.x),
                ColumnValue::new("lookahead_y", data.lookahead_point.y),
                ColumnValue::new("closest_x", data.closest_point.x),
                ColumnValue::new("closest_y", data.closest_point.y),
                ColumnValue::new("linear_velocity", data.lookahead_velocity),
                ColumnValue::new("closest_velocity", data.closest_point_velocity),
                ColumnValue::new("execution_time", data.execution_time),
            ],
        )])
    }
}

// ============================================================================
// SECTION: Control Commands
// ============================================================================

/// Actuator commands (`ControlCommand`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlCommandTransformer;

impl Transformer for ControlCommandTransformer {
    fn name(&self) -> &'static str {
        "control"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let DecodedMessage::ControlCommand(command) = message else {
            return Err(unexpected(self.name(), message));
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::row(
            FactTable::Control,
            time,
            run_id,
            vec![
                ColumnValue::new("throttle", command.throttle),
                ColumnValue::new("steering_angle", command.steering),
            ],
        )])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
