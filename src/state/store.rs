//! The shared state store.
//!
//! [`StateStore`] is a cheap-to-clone handle onto one [`SystemState`]
//! behind a single mutex. Every operation takes the lock for its whole
//! duration and does only in-memory work while holding it, so:
//!
//! - a snapshot never observes a half-applied command (fan-out writes to
//!   both axes land under one lock acquisition);
//! - writes are linearised, last-committed wins;
//! - no caller ever blocks on serial or network I/O through the store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use super::{
    ANGLE_LIMIT_MAX_DEG, Axis, AxisPair, AxisScope, Gains, GainsPatch, ImuPatch, ImuState, Mode,
    SystemState,
};
use crate::error::CommandError;

/// Result of a scoped write: which axes were touched plus the
/// post-write value of every axis, read under the same lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied<T> {
    pub scope: AxisScope,
    pub values: AxisPair<T>,
}

impl<T> Applied<T> {
    pub fn axes(&self) -> &'static [Axis] {
        self.scope.axes()
    }

    /// Value on the first targeted axis.
    pub fn primary(&self) -> &T {
        self.values.get(self.axes()[0])
    }
}

/// Handle onto the single stand state. Clone freely.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<Mutex<SystemState>>,
}

impl StateStore {
    /// Fresh store with zero-valued defaults.
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section is a plain field assignment, so a holder
    // that panicked cannot have left a torn record behind.
    fn lock(&self) -> MutexGuard<'_, SystemState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deep, consistent copy of the whole state.
    pub fn snapshot(&self) -> SystemState {
        self.lock().clone()
    }

    /// Copy of the IMU sub-record only.
    pub fn imu(&self) -> ImuState {
        self.lock().imu
    }

    // ── Global commands ───────────────────────────────────────

    pub fn set_mode(&self, mode: Mode) -> Mode {
        self.lock().mode = mode;
        debug!("mode -> {}", mode);
        mode
    }

    /// Parse and apply a mode token. Unknown tokens leave the mode untouched.
    pub fn set_mode_str(&self, token: &str) -> Result<Mode, CommandError> {
        let mode = token.parse::<Mode>()?;
        Ok(self.set_mode(mode))
    }

    /// Store `deg` clamped to `[0, 60]` and return the stored value.
    pub fn set_angle_limit(&self, deg: f64) -> f64 {
        let clamped = deg.clamp(0.0, ANGLE_LIMIT_MAX_DEG);
        self.lock().angle_limit_deg = clamped;
        clamped
    }

    pub fn reset_zero(&self) -> f64 {
        let mut s = self.lock();
        s.zero_offset_deg = 0.0;
        s.zero_offset_deg
    }

    pub fn reset_origin(&self) -> f64 {
        let mut s = self.lock();
        s.origin_deg = 0.0;
        s.origin_deg
    }

    // ── Axis-scoped commands ──────────────────────────────────

    /// Write the same setpoint to every axis in `scope`.
    pub fn set_setpoint(&self, deg: f64, scope: AxisScope) -> Applied<f64> {
        let mut s = self.lock();
        for &axis in scope.axes() {
            s.axes.get_mut(axis).setpoint_deg = deg;
        }
        Applied {
            scope,
            values: s.axes.map(|a| a.setpoint_deg),
        }
    }

    /// Merge the supplied subset of kp/ki/kd into every axis in `scope`.
    pub fn update_gains(
        &self,
        patch: GainsPatch,
        scope: AxisScope,
    ) -> Result<Applied<Gains>, CommandError> {
        if patch.is_empty() {
            return Err(CommandError::NoGainsProvided);
        }
        let mut s = self.lock();
        for &axis in scope.axes() {
            patch.apply_to(&mut s.axes.get_mut(axis).gains);
        }
        Ok(Applied {
            scope,
            values: s.axes.map(|a| a.gains),
        })
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Merge a partial IMU update. Returns `false` when nothing was recognised.
    pub fn merge_imu(&self, patch: &ImuPatch) -> bool {
        self.merge_imu_and_read(patch).0
    }

    /// [`merge_imu`](Self::merge_imu) plus the resulting IMU record, read
    /// under the same lock.
    pub fn merge_imu_and_read(&self, patch: &ImuPatch) -> (bool, ImuState) {
        let mut s = self.lock();
        if patch.is_empty() {
            return (false, s.imu);
        }
        patch.apply_to(&mut s.imu);
        (true, s.imu)
    }
}
