//! Stand state: the data model behind every command and telemetry path.
//!
//! [`SystemState`] is the singleton aggregate; [`store::StateStore`] owns
//! it behind one lock. The `*Patch` types carry partial updates: every
//! field is optional and only supplied fields are written.
//!
//! ```text
//!  SystemState
//!  ├── mode, angle_limit_deg, zero_offset_deg, origin_deg
//!  ├── axes: { x: AxisState, y: AxisState }
//!  └── imu:  ImuState (angle, gyro, accel, temp, t_ms)
//! ```

pub mod store;

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::error::CommandError;

/// Upper bound for the commanded deflection limit (degrees).
pub const ANGLE_LIMIT_MAX_DEG: f64 = 60.0;

// ───────────────────────────────────────────────────────────────
// Mode
// ───────────────────────────────────────────────────────────────

/// Operating mode selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "manuel")]
    Manual,
    #[serde(rename = "auto_tvc")]
    AutoTvc,
    #[serde(rename = "demo")]
    Demo,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manuel",
            Self::AutoTvc => "auto_tvc",
            Self::Demo => "demo",
        }
    }
}

impl FromStr for Mode {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manuel" => Ok(Self::Manual),
            "auto_tvc" => Ok(Self::AutoTvc),
            "demo" => Ok(Self::Demo),
            _ => Err(CommandError::InvalidMode),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Axes and axis scope
// ───────────────────────────────────────────────────────────────

/// One of the two gimbal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }
}

impl FromStr for Axis {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x" | "X" => Ok(Self::X),
            "y" | "Y" => Ok(Self::Y),
            _ => Err(CommandError::InvalidAxis),
        }
    }
}

/// The set of axes a command applies to. Unspecified means both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisScope {
    #[default]
    Both,
    Single(Axis),
}

impl AxisScope {
    /// Resolve an optional scope string. `None` selects both axes.
    pub fn parse(scope: Option<&str>) -> Result<Self, CommandError> {
        match scope {
            None => Ok(Self::Both),
            Some(s) => s.parse().map(Self::Single),
        }
    }

    /// Axes covered by this scope, in X-then-Y order.
    pub fn axes(self) -> &'static [Axis] {
        match self {
            Self::Both => &Axis::ALL,
            Self::Single(Axis::X) => &[Axis::X],
            Self::Single(Axis::Y) => &[Axis::Y],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Single(axis) => axis.as_str(),
        }
    }
}

/// A value per axis. Serialises as `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisPair<T> {
    pub x: T,
    pub y: T,
}

impl<T> AxisPair<T> {
    pub fn get(&self, axis: Axis) -> &T {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> AxisPair<U> {
        AxisPair {
            x: f(&self.x),
            y: f(&self.y),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Per-axis state
// ───────────────────────────────────────────────────────────────

/// Controller gains for one axis. Stored and reported, never executed here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// A partial gains update: only `Some` fields are written.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainsPatch {
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub kd: Option<f64>,
}

impl GainsPatch {
    pub fn is_empty(&self) -> bool {
        self.kp.is_none() && self.ki.is_none() && self.kd.is_none()
    }

    pub fn apply_to(&self, gains: &mut Gains) {
        if let Some(kp) = self.kp {
            gains.kp = kp;
        }
        if let Some(ki) = self.ki {
            gains.ki = ki;
        }
        if let Some(kd) = self.kd {
            gains.kd = kd;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AxisState {
    pub setpoint_deg: f64,
    /// Measured deflection (telemetry).
    pub angle_deg: f64,
    /// Last reported actuation.
    pub u: f64,
    /// Actuator saturation flag.
    pub sat: bool,
    pub gains: Gains,
}

// ───────────────────────────────────────────────────────────────
// IMU
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Per-component update of a [`Vec2`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2Patch {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Vec2Patch {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }

    fn apply_to(&self, v: &mut Vec2) {
        if let Some(x) = self.x {
            v.x = x;
        }
        if let Some(y) = self.y {
            v.y = y;
        }
    }
}

/// Per-component update of a [`Vec3`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3Patch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Vec3Patch {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    fn apply_to(&self, v: &mut Vec3) {
        if let Some(x) = self.x {
            v.x = x;
        }
        if let Some(y) = self.y {
            v.y = y;
        }
        if let Some(z) = self.z {
            v.z = z;
        }
    }
}

impl From<Vec3> for Vec3Patch {
    fn from(v: Vec3) -> Self {
        Self {
            x: Some(v.x),
            y: Some(v.y),
            z: Some(v.z),
        }
    }
}

/// Latest inertial sample from the stand controller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ImuState {
    pub angle_deg: Vec2,
    pub gyro_dps: Vec3,
    pub accel_g: Vec3,
    pub temp_c: f64,
    /// Device uptime stamp, passed through unvalidated.
    pub t_ms: f64,
}

/// Partial IMU update shared by the serial ingestor and `/api/imu/update`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuPatch {
    pub angle_deg: Option<Vec2Patch>,
    pub gyro_dps: Option<Vec3Patch>,
    pub accel_g: Option<Vec3Patch>,
    pub temp_c: Option<f64>,
    pub t_ms: Option<f64>,
}

impl ImuPatch {
    /// True when no field was recognised.
    pub fn is_empty(&self) -> bool {
        self.angle_deg.is_none()
            && self.gyro_dps.is_none()
            && self.accel_g.is_none()
            && self.temp_c.is_none()
            && self.t_ms.is_none()
    }

    pub fn apply_to(&self, imu: &mut ImuState) {
        if let Some(p) = &self.angle_deg {
            p.apply_to(&mut imu.angle_deg);
        }
        if let Some(p) = &self.gyro_dps {
            p.apply_to(&mut imu.gyro_dps);
        }
        if let Some(p) = &self.accel_g {
            p.apply_to(&mut imu.accel_g);
        }
        if let Some(t) = self.temp_c {
            imu.temp_c = t;
        }
        if let Some(t) = self.t_ms {
            imu.t_ms = t;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// The whole stand state. Created zeroed at startup, never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SystemState {
    pub mode: Mode,
    pub angle_limit_deg: f64,
    pub zero_offset_deg: f64,
    pub origin_deg: f64,
    pub axes: AxisPair<AxisState>,
    pub imu: ImuState,
}
