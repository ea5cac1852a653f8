//! Command service: applies operator commands to the stand state.
//!
//! [`CommandService`] is the only path from the HTTP surface into the
//! [`StateStore`]. It executes one [`StandCommand`] and returns a
//! [`CommandReply`] carrying the post-write values plus a human-readable
//! message, so a thin client can render feedback directly.

use log::info;
use serde_json::{Value, json};

use crate::error::CommandError;
use crate::state::store::{Applied, StateStore};
use crate::state::{AxisScope, Gains, ImuState, Mode, SystemState};

use super::commands::StandCommand;

/// Outcome of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Mode(Mode),
    Setpoint(Applied<f64>),
    AngleLimit(f64),
    ZeroReset(f64),
    OriginReset(f64),
    Gains(Applied<Gains>),
    Imu { applied: bool, imu: ImuState },
}

impl CommandReply {
    pub fn message(&self) -> String {
        match self {
            Self::Mode(m) => format!("mode set to {m}"),
            Self::Setpoint(a) => format!(
                "setpoint {:.2} deg applied to {}",
                a.primary(),
                scope_label(a.scope)
            ),
            Self::AngleLimit(deg) => format!("angle limit set to {deg:.2} deg"),
            Self::ZeroReset(_) => "zero offset reset".into(),
            Self::OriginReset(_) => "origin reset".into(),
            Self::Gains(a) => format!("gains updated on {}", scope_label(a.scope)),
            Self::Imu { applied: true, .. } => "IMU updated".into(),
            Self::Imu { applied: false, .. } => "no recognised IMU fields, nothing changed".into(),
        }
    }

    /// Response body per route, always with `ok` and `msg`.
    pub fn to_json(&self) -> Value {
        let msg = self.message();
        match self {
            Self::Mode(m) => json!({ "ok": true, "mode": m, "msg": msg }),
            Self::Setpoint(a) => json!({
                "ok": true,
                "axis": a.scope.as_str(),
                "setpoint_deg": a.primary(),
                "axes_setpoint_deg": a.values,
                "msg": msg,
            }),
            Self::AngleLimit(deg) => json!({ "ok": true, "angle_limit_deg": deg, "msg": msg }),
            Self::ZeroReset(v) => json!({ "ok": true, "zero_offset_deg": v, "msg": msg }),
            Self::OriginReset(v) => json!({ "ok": true, "origin_deg": v, "msg": msg }),
            Self::Gains(a) => json!({
                "ok": true,
                "axis": a.scope.as_str(),
                "gains": a.primary(),
                "axes_gains": a.values,
                "msg": msg,
            }),
            Self::Imu { applied, imu } => json!({ "ok": applied, "imu": imu, "msg": msg }),
        }
    }
}

fn scope_label(scope: AxisScope) -> String {
    match scope {
        AxisScope::Both => "both axes".into(),
        AxisScope::Single(axis) => format!("axis {}", axis.as_str()),
    }
}

/// Executes commands against a shared [`StateStore`] handle.
#[derive(Debug, Clone)]
pub struct CommandService {
    store: StateStore,
}

impl CommandService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn snapshot(&self) -> SystemState {
        self.store.snapshot()
    }

    /// Apply one command. Errors leave the state untouched.
    pub fn execute(&self, cmd: StandCommand) -> Result<CommandReply, CommandError> {
        let reply = match cmd {
            StandCommand::SetMode(mode) => CommandReply::Mode(self.store.set_mode(mode)),
            StandCommand::SetSetpoint { deg, scope } => {
                CommandReply::Setpoint(self.store.set_setpoint(deg, scope))
            }
            StandCommand::SetAngleLimit(deg) => {
                CommandReply::AngleLimit(self.store.set_angle_limit(deg))
            }
            StandCommand::ResetZero => CommandReply::ZeroReset(self.store.reset_zero()),
            StandCommand::ResetOrigin => CommandReply::OriginReset(self.store.reset_origin()),
            StandCommand::UpdateGains { patch, scope } => {
                CommandReply::Gains(self.store.update_gains(patch, scope)?)
            }
            StandCommand::PatchImu(patch) => {
                let (applied, imu) = self.store.merge_imu_and_read(&patch);
                CommandReply::Imu { applied, imu }
            }
        };
        info!("CMD | {}", reply.message());
        Ok(reply)
    }
}
