// crates/telemetry-ingest-core/src/messages/decode.rs
// ============================================================================
// Module: Telemetry Ingest Payload Decoders
// Description: Field layouts for each registered wire type.
// Purpose: Map CDR bodies onto typed message variants.
// Dependencies: crate::messages::cdr
// ============================================================================

//! ## Overview
//! Decoders read fields in declaration order. Trailing bytes after the last
//! consumed field are tolerated so newer message revisions that append fields
//! still decode. Array shapes only need their element count; the count is
//! checked against the remaining body using a minimum element size.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::messages::ControlCommand;
use crate::messages::DecodedMessage;
use crate::messages::EvaluatorControlData;
use crate::messages::Header;
use crate::messages::MessageKind;
use crate::messages::Quaternion;
use crate::messages::QuaternionStamped;
use crate::messages::StampedScalar;
use crate::messages::Vector3;
use crate::messages::Vector3Stamped;
use crate::messages::VehicleState;
use crate::messages::cdr::CdrReader;
use crate::messages::cdr::DecodeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Smallest serialized cone: a position point.
pub const MIN_CONE_LEN: usize = 24;

/// Smallest serialized marker: header, namespace, ids, pose, scale, color.
pub const MIN_MARKER_LEN: usize = 100;

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Decodes a payload as the given kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the payload does not match the layout.
pub fn decode_payload(kind: MessageKind, payload: &[u8]) -> Result<DecodedMessage, DecodeError> {
    let mut reader = CdrReader::new(payload)?;
    let message = match kind {
        MessageKind::Float64 => DecodedMessage::Float64(reader.read_f64("data")?),
        MessageKind::ConeArray => DecodedMessage::ConeArray {
            count: reader.read_sequence_len("cone_array", MIN_CONE_LEN)?,
        },
        MessageKind::MarkerArray => DecodedMessage::MarkerArray {
            count: reader.read_sequence_len("markers", MIN_MARKER_LEN)?,
        },
        MessageKind::VehicleState => DecodedMessage::VehicleState(VehicleState {
            header: read_header(&mut reader)?,
            position: read_vector3(&mut reader, "position")?,
            theta: reader.read_f64("theta")?,
            linear_velocity: reader.read_f64("linear_velocity")?,
            angular_velocity: reader.read_f64("angular_velocity")?,
        }),
        MessageKind::EvaluatorControlData => DecodedMessage::EvaluatorControlData(EvaluatorControlData {
            header: read_header(&mut reader)?,
            lookahead_point: read_vector3(&mut reader, "lookahead_point")?,
            closest_point: read_vector3(&mut reader, "closest_point")?,
            lookahead_velocity: reader.read_f64("lookahead_velocity")?,
            closest_point_velocity: reader.read_f64("closest_point_velocity")?,
            execution_time: reader.read_f64("execution_time")?,
        }),
        MessageKind::ControlCommand => DecodedMessage::ControlCommand(ControlCommand {
            header: read_header(&mut reader)?,
            throttle: reader.read_f64("throttle")?,
            steering: reader.read_f64("steering")?,
        }),
        MessageKind::WheelRpm => DecodedMessage::WheelRpm(read_stamped_scalar(&mut reader, "rpm")?),
        MessageKind::SteeringAngle => {
            DecodedMessage::SteeringAngle(read_stamped_scalar(&mut reader, "steering_angle")?)
        }
        MessageKind::Vector3Stamped => DecodedMessage::Vector3Stamped(Vector3Stamped {
            header: read_header(&mut reader)?,
            vector: read_vector3(&mut reader, "vector")?,
        }),
        MessageKind::QuaternionStamped => DecodedMessage::QuaternionStamped(QuaternionStamped {
            header: read_header(&mut reader)?,
            quaternion: Quaternion {
                x: reader.read_f64("quaternion.x")?,
                y: reader.read_f64("quaternion.y")?,
                z: reader.read_f64("quaternion.z")?,
                w: reader.read_f64("quaternion.w")?,
            },
        }),
    };
    Ok(message)
}

// ============================================================================
// SECTION: Field Helpers
// ============================================================================

/// Reads a `std_msgs/Header`.
fn read_header(reader: &mut CdrReader<'_>) -> Result<Header, DecodeError> {
    Ok(Header {
        sec: reader.read_i32("header.stamp.sec")?,
        nanosec: reader.read_u32("header.stamp.nanosec")?,
        frame_id: reader.read_string("header.frame_id")?,
    })
}

/// Reads three consecutive doubles.
fn read_vector3(reader: &mut CdrReader<'_>, field: &str) -> Result<Vector3, DecodeError> {
    Ok(Vector3 {
        x: reader.read_f64(field)?,
        y: reader.read_f64(field)?,
        z: reader.read_f64(field)?,
    })
}

/// Reads a header followed by one double.
fn read_stamped_scalar(reader: &mut CdrReader<'_>, field: &str) -> Result<StampedScalar, DecodeError> {
    Ok(StampedScalar {
        header: read_header(reader)?,
        value: reader.read_f64(field)?,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
