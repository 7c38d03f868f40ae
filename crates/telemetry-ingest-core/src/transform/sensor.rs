// crates/telemetry-ingest-core/src/transform/sensor.rs
// ============================================================================
// Module: Sensor Transformer
// Description: Raw wheel speed and steering angle readings.
// Purpose: Emit metric rows into the sensor_data table.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! Wheel speed and steering angle topics share one metric-keyed table. Each
//! message contributes a single value under its own metric name.

// ============================================================================
// SECTION: Imports
// ============================================================================

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
// SECTION: Transformer
// ============================================================================

/// Vehicle sensor topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorTransformer {
    /// Rear-left wheel speed (`WheelRPM`).
    RearLeftRpm,
    /// Rear-right wheel speed (`WheelRPM`).
    RearRightRpm,
    /// Steering sensor angle (`SteeringAngle`).
    SteeringAngle,
}

impl SensorTransformer {
    /// Returns the metric name written for this topic.
    #[must_use]
    pub const fn metric(self) -> &'static str {
        match self {
            Self::RearLeftRpm => "rl_rpm",
            Self::RearRightRpm => "rr_rpm",
            Self::SteeringAngle => "steering_angle",
        }
    }
}

impl Transformer for SensorTransformer {
    fn name(&self) -> &'static str {
        "sensor"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let reading = match (self, message) {
            (Self::RearLeftRpm | Self::RearRightRpm, DecodedMessage::WheelRpm(reading))
            | (Self::SteeringAngle, DecodedMessage::SteeringAngle(reading)) => reading,
            _ => return Err(unexpected(self.name(), message)),
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::metric(FactTable::SensorData, time, run_id, self.metric(), reading.value)])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
