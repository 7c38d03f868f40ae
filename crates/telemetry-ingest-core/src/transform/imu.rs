// crates/telemetry-ingest-core/src/transform/imu.rs
// ============================================================================
// Module: IMU Transformer
// Description: Inertial measurements and filtered orientation.
// Purpose: Emit rows into the four IMU tables.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! Acceleration, angular velocity, and euler angles share the stamped vector
//! shape and differ only in target table and column names. The filtered
//! quaternion carries four components.

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
// SECTION: Transformer
// ============================================================================

/// IMU and orientation filter topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImuTransformer {
    /// Linear acceleration (`Vector3Stamped`).
    Acceleration,
    /// Angular velocity (`Vector3Stamped`).
    AngularVelocity,
    /// Roll, pitch, yaw (`Vector3Stamped`).
    EulerAngles,
    /// Orientation (`QuaternionStamped`).
    Orientation,
}

impl ImuTransformer {
    /// Returns the target table.
    #[must_use]
    pub const fn table(self) -> FactTable {
        match self {
            Self::Acceleration => FactTable::ImuAcceleration,
            Self::AngularVelocity => FactTable::ImuAngularVelocity,
            Self::EulerAngles => FactTable::ImuEulerAngles,
            Self::Orientation => FactTable::ImuQuaternion,
        }
    }
}

impl Transformer for ImuTransformer {
    fn name(&self) -> &'static str {
        "imu"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let values = match (self, message) {
            (Self::Acceleration | Self::AngularVelocity | Self::EulerAngles, DecodedMessage::Vector3Stamped(stamped)) => {
                let [x, y, z] = self.table().value_columns() else {
                    return Err(unexpected(self.name(), message));
                };
                vec![
                    ColumnValue::new(*x, stamped.vector.x),
                    ColumnValue::new(*y, stamped.vector.y),
                    ColumnValue::new(*z, stamped.vector.z),
                ]
            }
            (Self::Orientation, DecodedMessage::QuaternionStamped(stamped)) => vec![
                ColumnValue::new("x", stamped.quaternion.x),
                ColumnValue::new("y", stamped.quaternion.y),
                ColumnValue::new("z", stamped.quaternion.z),
                ColumnValue::new("w", stamped.quaternion.w),
            ],
            _ => return Err(unexpected(self.name(), message)),
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::row(self.table(), time, run_id, values)])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
