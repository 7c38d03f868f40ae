// crates/telemetry-ingest-core/src/runtime/registry.rs
// ============================================================================
// Module: Telemetry Ingest Schema Registry
// Description: Static topic routing to decoders and transformers.
// Purpose: Build the topic table once and share it with the dispatcher.
// Dependencies: crate::{core, messages, transform}
// ============================================================================

//! ## Overview
//! Each registered topic maps to exactly one wire type (its decoder) and one
//! transformer. Topics absent from the registry are not consumed. The
//! registry is an explicit value, built at startup and passed by reference.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::TopicName;
use crate::messages::MessageKind;
use crate::transform::ControlCommandTransformer;
use crate::transform::ControlMetricsTransformer;
use crate::transform::ImuTransformer;
use crate::transform::PerceptionTransformer;
use crate::transform::PlanningTransformer;
use crate::transform::SensorTransformer;
use crate::transform::StateEstimationTimingTransformer;
use crate::transform::Transformer;
use crate::transform::VehicleStateTransformer;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Decoder and transformer bound to one topic.
#[derive(Clone)]
pub struct TopicRoute {
    /// Wire type expected on the topic.
    pub kind: MessageKind,
    /// Transformer applied to decoded messages.
    pub transformer: Arc<dyn Transformer>,
}

impl fmt::Debug for TopicRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicRoute")
            .field("kind", &self.kind)
            .field("transformer", &self.transformer.name())
            .finish()
    }
}

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Topic was registered twice.
    #[error("topic already registered: {0}")]
    DuplicateTopic(String),
}

/// Topic routing table.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Routes keyed by topic.
    routes: BTreeMap<TopicName, TopicRoute>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a topic route.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTopic`] when the topic already has a
    /// route; each topic maps to exactly one decoder and transformer.
    pub fn register(
        &mut self,
        topic: impl Into<TopicName>,
        kind: MessageKind,
        transformer: Arc<dyn Transformer>,
    ) -> Result<(), RegistryError> {
        let topic = topic.into();
        if self.routes.contains_key(&topic) {
            return Err(RegistryError::DuplicateTopic(topic.to_string()));
        }
        self.routes.insert(
            topic,
            TopicRoute {
                kind,
                transformer,
            },
        );
        Ok(())
    }

    /// Returns the route for a topic.
    #[must_use]
    pub fn route(&self, topic: &TopicName) -> Option<&TopicRoute> {
        self.routes.get(topic)
    }

    /// Returns the registered topics in name order.
    pub fn topics(&self) -> impl Iterator<Item = &TopicName> {
        self.routes.keys()
    }

    /// Returns the number of registered topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true when no topic is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Builds the registry of vehicle subsystem topics.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the built-in table repeats a topic.
    pub fn vehicle_default() -> Result<Self, RegistryError> {
        let table: [(&str, MessageKind, Arc<dyn Transformer>); 19] = [
            (
                "/perception/execution_time",
                MessageKind::Float64,
                Arc::new(PerceptionTransformer::ExecutionTime),
            ),
            ("/perception/cones", MessageKind::ConeArray, Arc::new(PerceptionTransformer::ConeCount)),
            (
                "/state_estimation/execution_time/correction_step",
                MessageKind::Float64,
                Arc::new(StateEstimationTimingTransformer::CorrectionStep),
            ),
            (
                "/state_estimation/execution_time/prediction_step",
                MessageKind::Float64,
                Arc::new(StateEstimationTimingTransformer::PredictionStep),
            ),
            ("/state_estimation/vehicle_state", MessageKind::VehicleState, Arc::new(VehicleStateTransformer)),
            ("/path_planning/execution_time", MessageKind::Float64, Arc::new(PlanningTransformer::ExecutionTime)),
            ("/path_planning/yellow_cones", MessageKind::MarkerArray, Arc::new(PlanningTransformer::YellowCones)),
            ("/path_planning/blue_cones", MessageKind::MarkerArray, Arc::new(PlanningTransformer::BlueCones)),
            (
                "/path_planning/after_rem_yellow_cones",
                MessageKind::MarkerArray,
                Arc::new(PlanningTransformer::RemovedYellowCones),
            ),
            (
                "/path_planning/after_rem_blue_cones",
                MessageKind::MarkerArray,
                Arc::new(PlanningTransformer::RemovedBlueCones),
            ),
            ("/control/evaluator_data", MessageKind::EvaluatorControlData, Arc::new(ControlMetricsTransformer)),
            ("/as_msgs/controls", MessageKind::ControlCommand, Arc::new(ControlCommandTransformer)),
            ("/vehicle/rl_rpm", MessageKind::WheelRpm, Arc::new(SensorTransformer::RearLeftRpm)),
            ("/vehicle/rr_rpm", MessageKind::WheelRpm, Arc::new(SensorTransformer::RearRightRpm)),
            ("/vehicle/bosch_steering_angle", MessageKind::SteeringAngle, Arc::new(SensorTransformer::SteeringAngle)),
            ("/imu/acceleration", MessageKind::Vector3Stamped, Arc::new(ImuTransformer::Acceleration)),
            ("/imu/angular_velocity", MessageKind::Vector3Stamped, Arc::new(ImuTransformer::AngularVelocity)),
            ("/filter/euler", MessageKind::Vector3Stamped, Arc::new(ImuTransformer::EulerAngles)),
            ("/filter/quaternion", MessageKind::QuaternionStamped, Arc::new(ImuTransformer::Orientation)),
        ];
        let mut registry = Self::new();
        for (topic, kind, transformer) in table {
            registry.register(topic, kind, transformer)?;
        }
        Ok(registry)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
