//! Telemetry frame parser.
//!
//! One frame is one newline-terminated JSON object from the stand
//! controller, e.g.
//!
//! ```text
//! {"t_ms":1000,"accel":{"x":0.01,"y":0.02,"z":0.98},"gyro":{"x":0.1,"y":0,"z":0},"temp":24.5}
//! ```
//!
//! Accel and gyro each accept two historical key spellings. A vector is
//! only taken when x, y and z are all present and numeric; an incomplete
//! vector counts as absent. A frame carrying neither vector is rejected.

use serde_json::{Map, Value};

use crate::error::FrameError;
use crate::state::{ImuPatch, Vec3, Vec3Patch};

const ACCEL_KEYS: [&str; 2] = ["accel", "accel_g"];
const GYRO_KEYS: [&str; 2] = ["gyro", "gyro_dps"];
const TEMP_KEYS: [&str; 2] = ["temp", "temp_c"];
const TIME_KEYS: [&str; 1] = ["t_ms"];

/// Keys the firmware uses for out-of-band notices.
const NOTICE_KEYS: [&str; 3] = ["error", "warn", "status"];

/// A coherent sample extracted from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySample {
    pub accel_g: Option<Vec3>,
    pub gyro_dps: Option<Vec3>,
    pub temp_c: Option<f64>,
    pub t_ms: Option<f64>,
}

impl TelemetrySample {
    /// Express the sample as a store merge. Vectors are always complete.
    pub fn to_patch(&self) -> ImuPatch {
        ImuPatch {
            angle_deg: None,
            gyro_dps: self.gyro_dps.map(Vec3Patch::from),
            accel_g: self.accel_g.map(Vec3Patch::from),
            temp_c: self.temp_c,
            t_ms: self.t_ms,
        }
    }
}

/// Classification of one raw line.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `{"status": ...}` and nothing else.
    Heartbeat,
    Sample(TelemetrySample),
    /// Valid JSON that is not an object. Dropped without complaint.
    Ignored,
    Malformed(FrameError),
}

/// Classify a raw line. Never panics; every input maps to a [`Frame`].
pub fn parse_frame(line: &str) -> Frame {
    let line = line.trim();
    if !(line.starts_with('{') && line.ends_with('}')) {
        return Frame::Malformed(FrameError::NotJsonObject);
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(_) => return Frame::Malformed(FrameError::InvalidJson),
    };
    let Value::Object(map) = value else {
        return Frame::Ignored;
    };

    if map.len() == 1 && map.contains_key("status") {
        return Frame::Heartbeat;
    }

    let sample = TelemetrySample {
        accel_g: first_vec3(&map, &ACCEL_KEYS),
        gyro_dps: first_vec3(&map, &GYRO_KEYS),
        temp_c: first_number(&map, &TEMP_KEYS),
        t_ms: first_number(&map, &TIME_KEYS),
    };

    if sample.accel_g.is_none() && sample.gyro_dps.is_none() {
        let notice = NOTICE_KEYS.iter().any(|k| map.contains_key(*k));
        return Frame::Malformed(if notice {
            FrameError::DeviceReported
        } else {
            FrameError::NoMotionData
        });
    }

    Frame::Sample(sample)
}

fn first_vec3(map: &Map<String, Value>, keys: &[&str]) -> Option<Vec3> {
    keys.iter().find_map(|k| map.get(*k).and_then(complete_vec3))
}

fn complete_vec3(v: &Value) -> Option<Vec3> {
    let obj = v.as_object()?;
    Some(Vec3 {
        x: obj.get("x")?.as_f64()?,
        y: obj.get("y")?.as_f64()?,
        z: obj.get("z")?.as_f64()?,
    })
}

fn first_number(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| map.get(*k).and_then(Value::as_f64))
}
