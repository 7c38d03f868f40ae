// crates/telemetry-ingest-core/src/core/fact.rs
// ============================================================================
// Module: Telemetry Ingest Fact Model
// Description: Fact tables, conflict policies, and write requests.
// Purpose: Describe the rows transformers emit and sinks persist.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Every monitored subsystem writes into one fact table. Facts are keyed by
//! `(time, run_id)` or `(time, run_id, metric)`, and each table carries a
//! fixed list of numeric value columns. A [`WriteRequest`] is validated
//! against its table before any backend touches storage, so a row is either
//! written whole or rejected whole.
//!
//! Conflict handling is a per-table policy: duplicates are ignored by default
//! and `control_metrics` overwrites.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Fact Tables
// ============================================================================

/// Time-series fact tables populated by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactTable {
    /// Perception timing and cone counts (metric keyed).
    Perception,
    /// State-estimation correction and prediction timing (metric keyed).
    StateEstimationPredCorr,
    /// Estimated vehicle pose and velocity.
    StateEstimationState,
    /// State-estimation map quality metrics.
    StateEstimationMap,
    /// Planning timing and cone counts (metric keyed).
    Planning,
    /// Actuator commands.
    Control,
    /// Control evaluator metrics.
    ControlMetrics,
    /// Raw vehicle sensor readings (metric keyed).
    SensorData,
    /// IMU linear acceleration.
    ImuAcceleration,
    /// IMU angular velocity.
    ImuAngularVelocity,
    /// Filtered euler angles.
    ImuEulerAngles,
    /// Filtered orientation quaternion.
    ImuQuaternion,
}

/// Value columns shared by every metric-keyed table.
const METRIC_COLUMNS: &[&str] = &["metric_value"];

impl FactTable {
    /// All fact tables in provisioning order.
    pub const ALL: [Self; 12] = [
        Self::Perception,
        Self::StateEstimationPredCorr,
        Self::StateEstimationState,
        Self::StateEstimationMap,
        Self::Planning,
        Self::Control,
        Self::ControlMetrics,
        Self::SensorData,
        Self::ImuAcceleration,
        Self::ImuAngularVelocity,
        Self::ImuEulerAngles,
        Self::ImuQuaternion,
    ];

    /// Returns the persisted table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Perception => "perception",
            Self::StateEstimationPredCorr => "state_estimation_pred_corr",
            Self::StateEstimationState => "state_estimation_state",
            Self::StateEstimationMap => "state_estimation_map",
            Self::Planning => "planning",
            Self::Control => "control",
            Self::ControlMetrics => "control_metrics",
            Self::SensorData => "sensor_data",
            Self::ImuAcceleration => "imu_acceleration",
            Self::ImuAngularVelocity => "imu_angular_velocity",
            Self::ImuEulerAngles => "imu_euler_angles",
            Self::ImuQuaternion => "imu_quaternion",
        }
    }

    /// Resolves a persisted table name.
    #[must_use]
    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.table_name() == name)
    }

    /// Returns true when the key includes a metric name.
    #[must_use]
    pub const fn is_metric_keyed(self) -> bool {
        matches!(self, Self::Perception | Self::StateEstimationPredCorr | Self::Planning | Self::SensorData)
    }

    /// Returns the value columns in persisted order.
    #[must_use]
    pub const fn value_columns(self) -> &'static [&'static str] {
        match self {
            Self::Perception | Self::StateEstimationPredCorr | Self::Planning | Self::SensorData => {
                METRIC_COLUMNS
            }
            Self::StateEstimationState => {
                &["x", "y", "theta", "linear_velocity", "angular_velocity"]
            }
            Self::StateEstimationMap => &["map_metric_1", "map_metric_2"],
            Self::Control => &["throttle", "steering_angle"],
            Self::ControlMetrics => &[
                "lookahead_x",
                "lookahead_y",
                "closest_x",
                "closest_y",
                "linear_velocity",
                "closest_velocity",
                "execution_time",
            ],
            Self::ImuAcceleration => &["x_acceleration", "y_acceleration", "z_acceleration"],
            Self::ImuAngularVelocity => {
                &["x_angular_velocity", "y_angular_velocity", "z_angular_velocity"]
            }
            Self::ImuEulerAngles => &["roll", "pitch", "yaw"],
            Self::ImuQuaternion => &["x", "y", "z", "w"],
        }
    }

    /// Returns the key columns in persisted order.
    #[must_use]
    pub const fn key_columns(self) -> &'static [&'static str] {
        if self.is_metric_keyed() { &["time", "run_id", "metric"] } else { &["time", "run_id"] }
    }

    /// Returns the built-in conflict policy.
    #[must_use]
    pub const fn default_policy(self) -> ConflictPolicy {
        match self {
            Self::ControlMetrics => ConflictPolicy::Overwrite,
            _ => ConflictPolicy::Ignore,
        }
    }
}

impl fmt::Display for FactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

// ============================================================================
// SECTION: Reference Tables
// ============================================================================

/// Descriptive tables provisioned alongside the fact tables.
///
/// The pipeline does not populate these. Vehicle configurations are bounded
/// by a time window; parameter tables reference a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTable {
    /// Vehicle configuration values.
    VehicleData,
    /// Perception stack parameters.
    PerceptionParameters,
    /// State-estimation stack parameters.
    StateEstimationParameters,
    /// Planning stack parameters.
    PlanningParameters,
    /// Control stack parameters.
    ControlParameters,
}

impl ReferenceTable {
    /// All reference tables in provisioning order.
    pub const ALL: [Self; 5] = [
        Self::VehicleData,
        Self::PerceptionParameters,
        Self::StateEstimationParameters,
        Self::PlanningParameters,
        Self::ControlParameters,
    ];

    /// Returns the persisted table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::VehicleData => "vehicle_data",
            Self::PerceptionParameters => "perception_parameters",
            Self::StateEstimationParameters => "state_estimation_parameters",
            Self::PlanningParameters => "planning_parameters",
            Self::ControlParameters => "control_parameters",
        }
    }

    /// Returns the generated primary key column.
    #[must_use]
    pub const fn id_column(self) -> &'static str {
        match self {
            Self::VehicleData => "vehicle_config_id",
            Self::PerceptionParameters => "perception_param_id",
            Self::StateEstimationParameters => "state_est_param_id",
            Self::PlanningParameters => "planning_param_id",
            Self::ControlParameters => "control_param_id",
        }
    }

    /// Returns true when rows reference a run.
    #[must_use]
    pub const fn is_run_scoped(self) -> bool {
        !matches!(self, Self::VehicleData)
    }
}

// ============================================================================
// SECTION: Conflict Policies
// ============================================================================

/// Behavior when a write collides with an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the stored row; the new write is a no-op.
    Ignore,
    /// Replace the stored value columns.
    Overwrite,
}

/// Per-table conflict policies with optional overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictPolicies {
    /// Overrides keyed by table.
    overrides: BTreeMap<FactTable, ConflictPolicy>,
}

impl ConflictPolicies {
    /// Creates the built-in policy set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with one table's policy overridden.
    #[must_use]
    pub fn with_override(mut self, table: FactTable, policy: ConflictPolicy) -> Self {
        self.overrides.insert(table, policy);
        self
    }

    /// Returns the effective policy for a table.
    #[must_use]
    pub fn policy_for(&self, table: FactTable) -> ConflictPolicy {
        self.overrides.get(&table).copied().unwrap_or_else(|| table.default_policy())
    }
}

// ============================================================================
// SECTION: Write Requests
// ============================================================================

/// Key of a single fact row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey {
    /// Absolute UTC instant derived from the log timestamp.
    pub time: OffsetDateTime,
    /// Owning run.
    pub run_id: RunId,
    /// Metric name for metric-keyed tables.
    pub metric: Option<&'static str>,
}

/// One named value column of a fact row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnValue {
    /// Column name.
    pub column: &'static str,
    /// Column value.
    pub value: f64,
}

impl ColumnValue {
    /// Creates a column value pair.
    #[must_use]
    pub const fn new(column: &'static str, value: f64) -> Self {
        Self {
            column,
            value,
        }
    }
}

/// Upsert of one full fact row.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    /// Target table.
    pub table: FactTable,
    /// Row key.
    pub key: FactKey,
    /// Value columns, in any order.
    pub values: Vec<ColumnValue>,
}

/// Write request validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteRequestError {
    /// Metric presence does not match the table's key.
    #[error("table {table} {reason}")]
    MetricKey {
        /// Target table name.
        table: &'static str,
        /// Violation detail.
        reason: &'static str,
    },
    /// A value column is missing, repeated, or unknown.
    #[error("table {table} column {column}: {reason}")]
    Column {
        /// Target table name.
        table: &'static str,
        /// Offending column.
        column: String,
        /// Violation detail.
        reason: &'static str,
    },
}

impl WriteRequest {
    /// Creates a write request for a table without a metric key.
    #[must_use]
    pub const fn row(
        table: FactTable,
        time: OffsetDateTime,
        run_id: RunId,
        values: Vec<ColumnValue>,
    ) -> Self {
        Self {
            table,
            key: FactKey {
                time,
                run_id,
                metric: None,
            },
            values,
        }
    }

    /// Creates a write request for a metric-keyed table.
    #[must_use]
    pub fn metric(
        table: FactTable,
        time: OffsetDateTime,
        run_id: RunId,
        metric: &'static str,
        value: f64,
    ) -> Self {
        Self {
            table,
            key: FactKey {
                time,
                run_id,
                metric: Some(metric),
            },
            values: vec![ColumnValue::new("metric_value", value)],
        }
    }

    /// Validates the request and returns values in the table's column order.
    ///
    /// # Errors
    ///
    /// Returns [`WriteRequestError`] when the metric key or the value columns
    /// do not match the table exactly.
    pub fn ordered_values(&self) -> Result<Vec<f64>, WriteRequestError> {
        let table = self.table.table_name();
        match (self.table.is_metric_keyed(), self.key.metric) {
            (true, None) => {
                return Err(WriteRequestError::MetricKey {
                    table,
                    reason: "requires a metric",
                });
            }
            (false, Some(_)) => {
                return Err(WriteRequestError::MetricKey {
                    table,
                    reason: "does not accept a metric",
                });
            }
            (true, Some(metric)) if metric.is_empty() => {
                return Err(WriteRequestError::MetricKey {
                    table,
                    reason: "requires a non-empty metric",
                });
            }
            _ => {}
        }

        let columns = self.table.value_columns();
        for value in &self.values {
            if !columns.contains(&value.column) {
                return Err(WriteRequestError::Column {
                    table,
                    column: value.column.to_string(),
                    reason: "unknown column",
                });
            }
            if !value.value.is_finite() {
                return Err(WriteRequestError::Column {
                    table,
                    column: value.column.to_string(),
                    reason: "value is not finite",
                });
            }
        }

        let mut ordered = Vec::with_capacity(columns.len());
        for column in columns {
            let mut matches = self.values.iter().filter(|value| value.column == *column);
            let Some(found) = matches.next() else {
                return Err(WriteRequestError::Column {
                    table,
                    column: (*column).to_string(),
                    reason: "missing value",
                });
            };
            if matches.next().is_some() {
                return Err(WriteRequestError::Column {
                    table,
                    column: (*column).to_string(),
                    reason: "repeated value",
                });
            }
            ordered.push(found.value);
        }
        Ok(ordered)
    }
}

/// Result of an accepted upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The row was inserted or its values replaced.
    Written,
    /// The key already existed and the table ignores conflicts.
    Ignored,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
