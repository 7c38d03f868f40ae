// crates/telemetry-ingest-core/src/transform/perception.rs
// ============================================================================
// Module: Perception Transformer
// Description: Perception timing and cone counts.
// Purpose: Emit metric rows into the perception table.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! Perception publishes its execution time and the detected cone array; both
//! land in `perception` as metric rows.

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
use crate::transform::count_value;
use crate::transform::fact_time;
use crate::transform::unexpected;

// ============================================================================
// SECTION: Transformer
// ============================================================================

/// Perception topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerceptionTransformer {
    /// Pipeline execution time (`Float64`).
    ExecutionTime,
    /// Detected cones (`ConeArray`).
    ConeCount,
}

impl PerceptionTransformer {
    /// Returns the metric name written for this topic.
    #[must_use]
    pub const fn metric(self) -> &'static str {
        match self {
            Self::ExecutionTime => "execution_time",
            Self::ConeCount => "num_cones",
        }
    }
}

impl Transformer for PerceptionTransformer {
    fn name(&self) -> &'static str {
        "perception"
    }

    fn transform(
        &self,
        message: &DecodedMessage,
        run_id: RunId,
        timestamp: LogTimestamp,
    ) -> Result<Vec<WriteRequest>, ExtractionError> {
        let value = match (self, message) {
            (Self::ExecutionTime, DecodedMessage::Float64(value)) => *value,
            (
                Self::ConeCount,
                DecodedMessage::ConeArray {
                    count,
                },
            ) => count_value(*count)?,
            _ => return Err(unexpected(self.name(), message)),
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::metric(FactTable::Perception, time, run_id, self.metric(), value)])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
