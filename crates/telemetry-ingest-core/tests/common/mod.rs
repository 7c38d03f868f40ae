// crates/telemetry-ingest-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared payload and container builders for ingestion tests.
// Purpose: Produce CDR payloads and MCAP files without external tooling.
// Dependencies: telemetry-ingest-core
// ============================================================================

//! ## Overview
//! Builds little-endian CDR payloads for every registered wire type and
//! writes minimal unchunked MCAP containers (header, schemas, channels,
//! messages, data end, footer).

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared helpers are used by a subset of the test binaries."
)]

use std::collections::BTreeMap;

use telemetry_ingest_core::LogRecord;
use telemetry_ingest_core::LogTimestamp;
use telemetry_ingest_core::MessageKind;
use telemetry_ingest_core::TopicName;

// ============================================================================
// SECTION: CDR Payloads
// ============================================================================

/// Little-endian CDR body writer.
#[derive(Default)]
pub struct Cdr {
    /// Body bytes after the encapsulation header.
    body: Vec<u8>,
}

impl Cdr {
    /// Creates an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pads the body to a multiple of `size`.
    fn align(&mut self, size: usize) {
        while self.body.len() % size != 0 {
            self.body.push(0);
        }
    }

    /// Appends a u32.
    pub fn u32(mut self, value: u32) -> Self {
        self.align(4);
        self.body.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends an i32.
    pub fn i32(mut self, value: i32) -> Self {
        self.align(4);
        self.body.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends an f64.
    pub fn f64(mut self, value: f64) -> Self {
        self.align(8);
        self.body.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a null-terminated string.
    pub fn string(self, value: &str) -> Self {
        let len = u32::try_from(value.len() + 1).expect("string length");
        let mut this = self.u32(len);
        this.body.extend_from_slice(value.as_bytes());
        this.body.push(0);
        this
    }

    /// Appends a `std_msgs/Header`.
    pub fn header(self, frame_id: &str) -> Self {
        self.i32(1_700_000_000).u32(0).string(frame_id)
    }

    /// Appends raw bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// Returns the payload with a little-endian encapsulation header.
    pub fn finish(self) -> Vec<u8> {
        let mut payload = vec![0x00, 0x01, 0x00, 0x00];
        payload.extend_from_slice(&self.body);
        payload
    }
}

/// `std_msgs/Float64`.
pub fn float64(value: f64) -> Vec<u8> {
    Cdr::new().f64(value).finish()
}

/// Sequence of `count` elements of `element_len` zero bytes.
pub fn sequence(count: u32, element_len: usize) -> Vec<u8> {
    let total = usize::try_from(count).expect("count") * element_len;
    Cdr::new().u32(count).raw(&vec![0_u8; total]).finish()
}

/// `custom_interfaces/ConeArray` with `count` cones.
pub fn cone_array(count: u32) -> Vec<u8> {
    sequence(count, 24)
}

/// `visualization_msgs/MarkerArray` with `count` markers.
pub fn marker_array(count: u32) -> Vec<u8> {
    sequence(count, 128)
}

/// `custom_interfaces/VehicleState`.
pub fn vehicle_state(x: f64, y: f64, theta: f64, linear: f64, angular: f64) -> Vec<u8> {
    Cdr::new()
        .header("map")
        .f64(x)
        .f64(y)
        .f64(0.0)
        .f64(theta)
        .f64(linear)
        .f64(angular)
        .finish()
}

/// `custom_interfaces/EvaluatorControlData`.
pub fn evaluator(lookahead: (f64, f64), closest: (f64, f64), velocities: (f64, f64), execution_time: f64) -> Vec<u8> {
    Cdr::new()
        .header("base_link")
        .f64(lookahead.0)
        .f64(lookahead.1)
        .f64(0.0)
        .f64(closest.0)
        .f64(closest.1)
        .f64(0.0)
        .f64(velocities.0)
        .f64(velocities.1)
        .f64(execution_time)
        .finish()
}

/// `custom_interfaces/ControlCommand`.
pub fn control_command(throttle: f64, steering: f64) -> Vec<u8> {
    Cdr::new().header("base_link").f64(throttle).f64(steering).finish()
}

/// Header followed by one double (`WheelRPM`, `SteeringAngle`).
pub fn stamped_scalar(value: f64) -> Vec<u8> {
    Cdr::new().header("vehicle").f64(value).finish()
}

/// `geometry_msgs/Vector3Stamped`.
pub fn vector3_stamped(x: f64, y: f64, z: f64) -> Vec<u8> {
    Cdr::new().header("imu").f64(x).f64(y).f64(z).finish()
}

/// `geometry_msgs/QuaternionStamped`.
pub fn quaternion_stamped(x: f64, y: f64, z: f64, w: f64) -> Vec<u8> {
    Cdr::new().header("imu").f64(x).f64(y).f64(z).f64(w).finish()
}

// ============================================================================
// SECTION: Log Records
// ============================================================================

/// Builds a record with the registered type name of `kind`.
pub fn record(topic: &str, kind: MessageKind, payload: Vec<u8>, nanos: i64) -> LogRecord {
    LogRecord {
        topic: TopicName::new(topic),
        type_name: Some(kind.type_name().to_string()),
        payload,
        timestamp: LogTimestamp::from_nanos(nanos),
    }
}

/// Builds a record on a topic the pipeline does not consume.
pub fn foreign_record(topic: &str, nanos: i64) -> LogRecord {
    LogRecord {
        topic: TopicName::new(topic),
        type_name: Some("rcl_interfaces/msg/Log".to_string()),
        payload: vec![0x00, 0x01, 0x00, 0x00],
        timestamp: LogTimestamp::from_nanos(nanos),
    }
}

/// One record per registered topic, at `base + offset` in this order, then
/// one record on an unregistered topic.
///
/// | offset | topic | fact |
/// |---|---|---|
/// | 0-1 | perception timing, cones | `perception` metrics |
/// | 2-3 | correction and prediction timing | `state_estimation_pred_corr` metrics |
/// | 4 | vehicle state | `state_estimation_state` row |
/// | 5-9 | planning timing and cone counts | `planning` metrics |
/// | 10 | evaluator data | `control_metrics` row |
/// | 11 | control command | `control` row |
/// | 12-14 | wheel speeds, steering angle | `sensor_data` metrics |
/// | 15-18 | IMU and filter vectors | one row per `imu_*` table |
/// | 19 | `/rosout` | none |
pub fn session(base: i64) -> Vec<LogRecord> {
    vec![
        record("/perception/execution_time", MessageKind::Float64, float64(0.012), base),
        record("/perception/cones", MessageKind::ConeArray, cone_array(14), base + 1),
        record(
            "/state_estimation/execution_time/correction_step",
            MessageKind::Float64,
            float64(0.002),
            base + 2,
        ),
        record(
            "/state_estimation/execution_time/prediction_step",
            MessageKind::Float64,
            float64(0.001),
            base + 3,
        ),
        record("/state_estimation/vehicle_state", MessageKind::VehicleState, vehicle_state(1.0, 2.0, 0.1, 3.0, 0.2), base + 4),
        record("/path_planning/execution_time", MessageKind::Float64, float64(0.03), base + 5),
        record("/path_planning/yellow_cones", MessageKind::MarkerArray, marker_array(6), base + 6),
        record("/path_planning/blue_cones", MessageKind::MarkerArray, marker_array(5), base + 7),
        record("/path_planning/after_rem_yellow_cones", MessageKind::MarkerArray, marker_array(2), base + 8),
        record("/path_planning/after_rem_blue_cones", MessageKind::MarkerArray, marker_array(1), base + 9),
        record(
            "/control/evaluator_data",
            MessageKind::EvaluatorControlData,
            evaluator((1.0, 1.5), (0.5, 0.7), (4.0, 3.5), 0.004),
            base + 10,
        ),
        record("/as_msgs/controls", MessageKind::ControlCommand, control_command(0.6, -0.1), base + 11),
        record("/vehicle/rl_rpm", MessageKind::WheelRpm, stamped_scalar(820.0), base + 12),
        record("/vehicle/rr_rpm", MessageKind::WheelRpm, stamped_scalar(815.0), base + 13),
        record("/vehicle/bosch_steering_angle", MessageKind::SteeringAngle, stamped_scalar(0.05), base + 14),
        record("/imu/acceleration", MessageKind::Vector3Stamped, vector3_stamped(0.1, 0.0, 9.8), base + 15),
        record("/imu/angular_velocity", MessageKind::Vector3Stamped, vector3_stamped(0.0, 0.02, 0.3), base + 16),
        record("/filter/euler", MessageKind::Vector3Stamped, vector3_stamped(0.01, -0.02, 1.57), base + 17),
        record("/filter/quaternion", MessageKind::QuaternionStamped, quaternion_stamped(0.0, 0.0, 0.0, 1.0), base + 18),
        foreign_record("/rosout", base + 19),
    ]
}

// ============================================================================
// SECTION: MCAP Containers
// ============================================================================

/// MCAP magic bytes.
const MAGIC: &[u8] = b"\x89MCAP0\r\n";

/// Writer for minimal unchunked MCAP containers.
pub struct McapBuilder {
    /// Container bytes written so far.
    bytes: Vec<u8>,
    /// Channel ids keyed by topic.
    channels: BTreeMap<String, u16>,
    /// Schema ids keyed by type name.
    schemas: BTreeMap<String, u16>,
    /// Per-channel message sequence.
    sequence: u32,
}

impl McapBuilder {
    /// Starts a container with the magic and header record.
    pub fn new() -> Self {
        let mut builder = Self {
            bytes: MAGIC.to_vec(),
            channels: BTreeMap::new(),
            schemas: BTreeMap::new(),
            sequence: 0,
        };
        let mut header = Vec::new();
        put_string(&mut header, "ros2");
        put_string(&mut header, "telemetry-ingest-tests");
        builder.record(0x01, &header);
        builder
    }

    /// Appends one record.
    fn record(&mut self, opcode: u8, content: &[u8]) {
        self.bytes.push(opcode);
        self.bytes.extend_from_slice(&(content.len() as u64).to_le_bytes());
        self.bytes.extend_from_slice(content);
    }

    /// Returns the schema id for a type, writing the schema record once.
    fn schema(&mut self, type_name: &str) -> u16 {
        if let Some(id) = self.schemas.get(type_name) {
            return *id;
        }
        let id = u16::try_from(self.schemas.len() + 1).expect("schema id");
        let mut content = id.to_le_bytes().to_vec();
        put_string(&mut content, type_name);
        put_string(&mut content, "ros2msg");
        content.extend_from_slice(&0_u32.to_le_bytes());
        self.record(0x03, &content);
        self.schemas.insert(type_name.to_string(), id);
        id
    }

    /// Returns the channel id for a topic, writing the channel record once.
    fn channel(&mut self, topic: &str, type_name: Option<&str>) -> u16 {
        if let Some(id) = self.channels.get(topic) {
            return *id;
        }
        let schema_id = type_name.map_or(0, |name| self.schema(name));
        let id = u16::try_from(self.channels.len() + 1).expect("channel id");
        let mut content = id.to_le_bytes().to_vec();
        content.extend_from_slice(&schema_id.to_le_bytes());
        put_string(&mut content, topic);
        put_string(&mut content, "cdr");
        content.extend_from_slice(&0_u32.to_le_bytes());
        self.record(0x04, &content);
        self.channels.insert(topic.to_string(), id);
        id
    }

    /// Appends a message record on a channel id.
    fn message_on(&mut self, channel_id: u16, log_time: u64, payload: &[u8]) {
        self.sequence += 1;
        let mut content = channel_id.to_le_bytes().to_vec();
        content.extend_from_slice(&self.sequence.to_le_bytes());
        content.extend_from_slice(&log_time.to_le_bytes());
        content.extend_from_slice(&log_time.to_le_bytes());
        content.extend_from_slice(payload);
        self.record(0x05, &content);
    }

    /// Appends a log record, declaring its channel and schema as needed.
    pub fn push(mut self, record: &LogRecord) -> Self {
        let channel_id = self.channel(record.topic.as_str(), record.type_name.as_deref());
        let log_time = u64::try_from(record.timestamp.as_nanos()).expect("non-negative log time");
        self.message_on(channel_id, log_time, &record.payload);
        self
    }

    /// Appends a message that references a channel never declared.
    pub fn push_unknown_channel(mut self, log_time: u64) -> Self {
        self.message_on(u16::MAX, log_time, &float64(0.0));
        self
    }

    /// Appends a message with a log time beyond the signed range.
    pub fn push_unsigned_overflow(mut self, topic: &str) -> Self {
        let channel_id = self.channel(topic, Some(MessageKind::Float64.type_name()));
        self.message_on(channel_id, u64::MAX, &float64(0.0));
        self
    }

    /// Closes the data section and writes the footer and trailing magic.
    pub fn finish(mut self) -> Vec<u8> {
        self.record(0x0F, &0_u32.to_le_bytes());
        let mut footer = Vec::new();
        footer.extend_from_slice(&0_u64.to_le_bytes());
        footer.extend_from_slice(&0_u64.to_le_bytes());
        footer.extend_from_slice(&0_u32.to_le_bytes());
        self.record(0x02, &footer);
        self.bytes.extend_from_slice(MAGIC);
        self.bytes
    }
}

/// Writes a length-prefixed MCAP string.
fn put_string(buf: &mut Vec<u8>, value: &str) {
    let len = u32::try_from(value.len()).expect("string length");
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
}

/// Encodes records into a complete MCAP container.
pub fn mcap_bytes(records: &[LogRecord]) -> Vec<u8> {
    records.iter().fold(McapBuilder::new(), McapBuilder::push).finish()
}
