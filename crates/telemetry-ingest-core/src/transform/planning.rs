// crates/telemetry-ingest-core/src/transform/planning.rs
// ============================================================================
// Module: Planning Transformer
// Description: Planner timing and boundary cone counts.
// Purpose: Emit metric rows into the planning table.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! The planner publishes its execution time plus four marker arrays: yellow
//! and blue boundary cones before and after outlier removal. Each marker
//! array contributes its element count.

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

/// Planning topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningTransformer {
    /// Planner execution time (`Float64`).
    ExecutionTime,
    /// Yellow boundary cones (`MarkerArray`).
    YellowCones,
    /// Blue boundary cones (`MarkerArray`).
    BlueCones,
    /// Yellow cones kept after outlier removal (`MarkerArray`).
    RemovedYellowCones,
    /// Blue cones kept after outlier removal (`MarkerArray`).
    RemovedBlueCones,
}

impl PlanningTransformer {
    /// Returns the metric name written for this topic.
    #[must_use]
    pub const fn metric(self) -> &'static str {
        match self {
            Self::ExecutionTime => "execution_time",
            Self::YellowCones => "num_yellow_cones",
            Self::BlueCones => "num_blue_cones",
            Self::RemovedYellowCones => "num_removed_yellow_cones",
            Self::RemovedBlueCones => "num_removed_blue_cones",
        }
    }
}

impl Transformer for PlanningTransformer {
    fn name(&self) -> &'static str {
        "planning"
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
                Self::YellowCones | Self::BlueCones | Self::RemovedYellowCones | Self::RemovedBlueCones,
                DecodedMessage::MarkerArray {
                    count,
                },
            ) => count_value(*count)?,
            _ => return Err(unexpected(self.name(), message)),
        };
        let time = fact_time(timestamp)?;
        Ok(vec![WriteRequest::metric(FactTable::Planning, time, run_id, self.metric(), value)])
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
