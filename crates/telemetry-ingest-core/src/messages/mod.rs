// crates/telemetry-ingest-core/src/messages/mod.rs
// ============================================================================
// Module: Telemetry Ingest Message Shapes
// Description: Typed message shapes decoded from recorded payloads.
// Purpose: Turn opaque bytes into validated variants before transformation.
// Dependencies: crate::messages::{cdr, decode}
// ============================================================================

//! ## Overview
//! Each registered topic carries one of a small set of message kinds. A
//! [`MessageKind`] names the wire type and decodes its payload into a
//! [`DecodedMessage`] variant; shape validation happens here so transformers
//! only see well-formed values.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cdr;
pub mod decode;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cdr::CdrReader;
pub use cdr::DecodeError;

// ============================================================================
// SECTION: Message Kinds
// ============================================================================

/// Wire types understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `std_msgs/msg/Float64`.
    Float64,
    /// `custom_interfaces/msg/ConeArray`.
    ConeArray,
    /// `visualization_msgs/msg/MarkerArray`.
    MarkerArray,
    /// `custom_interfaces/msg/VehicleState`.
    VehicleState,
    /// `custom_interfaces/msg/EvaluatorControlData`.
    EvaluatorControlData,
    /// `custom_interfaces/msg/ControlCommand`.
    ControlCommand,
    /// `custom_interfaces/msg/WheelRPM`.
    WheelRpm,
    /// `custom_interfaces/msg/SteeringAngle`.
    SteeringAngle,
    /// `geometry_msgs/msg/Vector3Stamped`.
    Vector3Stamped,
    /// `geometry_msgs/msg/QuaternionStamped`.
    QuaternionStamped,
}

impl MessageKind {
    /// Returns the type descriptor recorded in the log schema.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Float64 => "std_msgs/msg/Float64",
            Self::ConeArray => "custom_interfaces/msg/ConeArray",
            Self::MarkerArray => "visualization_msgs/msg/MarkerArray",
            Self::VehicleState => "custom_interfaces/msg/VehicleState",
            Self::EvaluatorControlData => "custom_interfaces/msg/EvaluatorControlData",
            Self::ControlCommand => "custom_interfaces/msg/ControlCommand",
            Self::WheelRpm => "custom_interfaces/msg/WheelRPM",
            Self::SteeringAngle => "custom_interfaces/msg/SteeringAngle",
            Self::Vector3Stamped => "geometry_msgs/msg/Vector3Stamped",
            Self::QuaternionStamped => "geometry_msgs/msg/QuaternionStamped",
        }
    }

    /// Decodes a payload after checking the record's type descriptor.
    ///
    /// A record without a descriptor is decoded as this kind.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TypeMismatch`] when the descriptor names another
    /// type, or any decoding error raised by the payload.
    pub fn decode(self, type_name: Option<&str>, payload: &[u8]) -> Result<DecodedMessage, DecodeError> {
        if let Some(found) = type_name
            && found != self.type_name()
        {
            return Err(DecodeError::TypeMismatch(format!(
                "expected {}, found {found}",
                self.type_name()
            )));
        }
        decode::decode_payload(self, payload)
    }
}

// ============================================================================
// SECTION: Shared Fields
// ============================================================================

/// `std_msgs/Header` stamp and frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Stamp seconds.
    pub sec: i32,
    /// Stamp nanoseconds.
    pub nanosec: u32,
    /// Coordinate frame name.
    pub frame_id: String,
}

/// Three-component vector or point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

/// Orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// W component.
    pub w: f64,
}

// ============================================================================
// SECTION: Decoded Messages
// ============================================================================

/// Estimated vehicle pose and velocities.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Message header.
    pub header: Header,
    /// Estimated position.
    pub position: Vector3,
    /// Heading in radians.
    pub theta: f64,
    /// Linear velocity.
    pub linear_velocity: f64,
    /// Angular velocity.
    pub angular_velocity: f64,
}

/// Controller evaluation sample.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorControlData {
    /// Message header.
    pub header: Header,
    /// Lookahead target point.
    pub lookahead_point: Vector3,
    /// Closest path point.
    pub closest_point: Vector3,
    /// Velocity at the lookahead point.
    pub lookahead_velocity: f64,
    /// Velocity at the closest point.
    pub closest_point_velocity: f64,
    /// Controller execution time.
    pub execution_time: f64,
}

/// Actuator command.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlCommand {
    /// Message header.
    pub header: Header,
    /// Throttle command.
    pub throttle: f64,
    /// Steering command.
    pub steering: f64,
}

/// Scalar sensor reading with a header.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedScalar {
    /// Message header.
    pub header: Header,
    /// Reading.
    pub value: f64,
}

/// Stamped vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector3Stamped {
    /// Message header.
    pub header: Header,
    /// Vector payload.
    pub vector: Vector3,
}

/// Stamped quaternion.
#[derive(Debug, Clone, PartialEq)]
pub struct QuaternionStamped {
    /// Message header.
    pub header: Header,
    /// Quaternion payload.
    pub quaternion: Quaternion,
}

/// Validated message, one variant per wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    /// Single float value.
    Float64(f64),
    /// Number of cones in a cone array.
    ConeArray {
        /// Element count.
        count: usize,
    },
    /// Number of markers in a marker array.
    MarkerArray {
        /// Element count.
        count: usize,
    },
    /// Vehicle state estimate.
    VehicleState(VehicleState),
    /// Controller evaluation sample.
    EvaluatorControlData(EvaluatorControlData),
    /// Actuator command.
    ControlCommand(ControlCommand),
    /// Wheel speed reading.
    WheelRpm(StampedScalar),
    /// Steering angle reading.
    SteeringAngle(StampedScalar),
    /// Stamped vector.
    Vector3Stamped(Vector3Stamped),
    /// Stamped quaternion.
    QuaternionStamped(QuaternionStamped),
}

impl DecodedMessage {
    /// Returns the wire type this message was decoded from.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Float64(_) => MessageKind::Float64,
            Self::ConeArray {
                ..
            } => MessageKind::ConeArray,
            Self::MarkerArray {
                ..
            } => MessageKind::MarkerArray,
            Self::VehicleState(_) => MessageKind::VehicleState,
            Self::EvaluatorControlData(_) => MessageKind::EvaluatorControlData,
            Self::ControlCommand(_) => MessageKind::ControlCommand,
            Self::WheelRpm(_) => MessageKind::WheelRpm,
            Self::SteeringAngle(_) => MessageKind::SteeringAngle,
            Self::Vector3Stamped(_) => MessageKind::Vector3Stamped,
            Self::QuaternionStamped(_) => MessageKind::QuaternionStamped,
        }
    }
}
