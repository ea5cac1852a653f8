//! Inbound operator commands.
//!
//! Each HTTP command route decodes its JSON body into a [`StandCommand`]
//! here, so validation happens once and before any state is touched.
//! Decoding rules:
//!
//! - numbers may be JSON numbers or numeric strings, and must be finite;
//! - `axis` absent or `null` means both axes;
//! - unknown keys are ignored.

use serde_json::{Map, Value};

use crate::error::CommandError;
use crate::state::{AxisScope, GainsPatch, ImuPatch, Mode, Vec2Patch, Vec3Patch};

/// Commands the HTTP surface can send into the [`CommandService`](super::service::CommandService).
#[derive(Debug, Clone, PartialEq)]
pub enum StandCommand {
    SetMode(Mode),
    SetSetpoint { deg: f64, scope: AxisScope },
    SetAngleLimit(f64),
    ResetZero,
    ResetOrigin,
    UpdateGains { patch: GainsPatch, scope: AxisScope },
    PatchImu(ImuPatch),
}

type Body = Map<String, Value>;

impl StandCommand {
    /// `{"mode": "manuel" | "auto_tvc" | "demo"}`
    pub fn mode(body: &Body) -> Result<Self, CommandError> {
        body.get("mode")
            .and_then(Value::as_str)
            .ok_or(CommandError::InvalidMode)?
            .parse()
            .map(Self::SetMode)
    }

    /// `{"deg": number, "axis"?: "x" | "y"}`
    pub fn setpoint(body: &Body) -> Result<Self, CommandError> {
        let scope = axis_scope(body)?;
        let deg = required_number(body, "deg")?;
        Ok(Self::SetSetpoint { deg, scope })
    }

    /// `{"deg": number}`
    pub fn angle_limit(body: &Body) -> Result<Self, CommandError> {
        required_number(body, "deg").map(Self::SetAngleLimit)
    }

    /// `{"axis"?: "x" | "y", "kp"?: number, "ki"?: number, "kd"?: number}`
    ///
    /// An empty gains set decodes fine; the store's `update_gains` rejects it.
    pub fn gains(body: &Body) -> Result<Self, CommandError> {
        let scope = axis_scope(body)?;
        let patch = GainsPatch {
            kp: optional_number(body, "kp")?,
            ki: optional_number(body, "ki")?,
            kd: optional_number(body, "kd")?,
        };
        Ok(Self::UpdateGains { patch, scope })
    }

    /// Any subset of `angle_deg{x,y}`, `gyro_dps{x,y,z}`, `accel_g{x,y,z}`,
    /// `temp_c`, `t_ms`. Vector components may be partial; a vector with no
    /// known component counts as absent.
    pub fn imu_update(body: &Body) -> Result<Self, CommandError> {
        Ok(Self::PatchImu(ImuPatch {
            angle_deg: vec2_patch(body, "angle_deg")?,
            gyro_dps: vec3_patch(body, "gyro_dps")?,
            accel_g: vec3_patch(body, "accel_g")?,
            temp_c: optional_number(body, "temp_c")?,
            t_ms: optional_number(body, "t_ms")?,
        }))
    }
}

// ── Field decoding ────────────────────────────────────────────

fn axis_scope(body: &Body) -> Result<AxisScope, CommandError> {
    match body.get("axis") {
        None | Some(Value::Null) => Ok(AxisScope::Both),
        Some(Value::String(s)) => AxisScope::parse(Some(s.as_str())),
        Some(_) => Err(CommandError::InvalidAxis),
    }
}

fn required_number(body: &Body, field: &'static str) -> Result<f64, CommandError> {
    optional_number(body, field)?.ok_or(CommandError::InvalidNumber(field))
}

fn optional_number(body: &Body, field: &'static str) -> Result<Option<f64>, CommandError> {
    let n = match body.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match n {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(CommandError::InvalidNumber(field)),
    }
}

fn vector<'a>(body: &'a Body, field: &'static str) -> Result<Option<&'a Body>, CommandError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(v)) => Ok(Some(v)),
        Some(_) => Err(CommandError::InvalidImuShape(field)),
    }
}

fn vec2_patch(body: &Body, field: &'static str) -> Result<Option<Vec2Patch>, CommandError> {
    let Some(v) = vector(body, field)? else {
        return Ok(None);
    };
    let component = |c| optional_number(v, c).map_err(|_| CommandError::InvalidNumber(field));
    let patch = Vec2Patch {
        x: component("x")?,
        y: component("y")?,
    };
    Ok(Some(patch).filter(|p| !p.is_empty()))
}

fn vec3_patch(body: &Body, field: &'static str) -> Result<Option<Vec3Patch>, CommandError> {
    let Some(v) = vector(body, field)? else {
        return Ok(None);
    };
    let component = |c| optional_number(v, c).map_err(|_| CommandError::InvalidNumber(field));
    let patch = Vec3Patch {
        x: component("x")?,
        y: component("y")?,
        z: component("z")?,
    };
    Ok(Some(patch).filter(|p| !p.is_empty()))
}
