//! Launch Control
//!
//! Holds the craft stationary on the ground at race start: a dedicated low
//! integral gain counters prop torque without winding up, and an optional
//! attitude clamp commands the craft back level if it starts tipping. The
//! external trigger (throttle raise detected by the RC layer) releases the
//! hold; whether the trigger can be re-armed afterwards is configurable.

use openflight_profile::{LaunchControlMode, PidProfile};
use tracing::debug;

use crate::axis::Axis;
use crate::consts::ITERM_SCALE;

/// State for the launch-control stage.
#[derive(Debug, Clone, Copy)]
pub struct LaunchControlState {
    mode: LaunchControlMode,
    ki: f32,
    angle_limit: f32,
    allow_trigger_reset: bool,
    active: bool,
    triggered: bool,
}

impl LaunchControlState {
    /// Derive the stage from the profile.
    pub fn from_profile(profile: &PidProfile) -> Self {
        Self {
            mode: profile.launch_control_mode,
            ki: ITERM_SCALE * f32::from(profile.launch_control_gain),
            angle_limit: f32::from(profile.launch_control_angle_limit),
            allow_trigger_reset: profile.launch_control_allow_trigger_reset,
            active: false,
            triggered: false,
        }
    }

    /// Re-arm the hold (e.g. entering the launch flight mode). Once the
    /// trigger has fired, re-arming requires `allow_trigger_reset`.
    pub fn init(&mut self) {
        if self.triggered && !self.allow_trigger_reset {
            return;
        }
        self.triggered = false;
        self.active = true;
        debug!("launch control armed");
    }

    /// Activate or release the hold. Releasing records the trigger.
    pub fn set_active(&mut self, active: bool) {
        if self.active && !active {
            self.triggered = true;
            debug!("launch control released");
        }
        self.active = active && !(self.triggered && !self.allow_trigger_reset);
    }

    /// Whether the hold is currently active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the launch trigger has fired since the last re-arm.
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Integral gain to use while the hold is active.
    pub fn ki(&self) -> f32 {
        self.ki
    }

    /// Whether this axis participates in the hold.
    pub fn applies_to(&self, axis: Axis) -> bool {
        match self.mode {
            LaunchControlMode::PitchOnly => axis == Axis::Pitch,
            LaunchControlMode::Normal | LaunchControlMode::Full => true,
        }
    }

    /// Integral error for one axis while holding.
    ///
    /// Pitch-only mode accumulates nose-up correction only (the craft rests
    /// on its tail stand; pushing further down would dig it in).
    pub fn iterm_error(&self, axis: Axis, error_rate: f32) -> f32 {
        if !self.applies_to(axis) {
            return 0.0;
        }
        if self.mode == LaunchControlMode::PitchOnly && axis == Axis::Pitch {
            return error_rate.max(0.0);
        }
        error_rate
    }

    /// Corrective rate setpoint clamping attitude while holding, deg/s.
    ///
    /// Zero when the angle limit is off or the craft is inside it.
    pub fn attitude_correction(&self, axis: Axis, attitude_deg: f32) -> f32 {
        if self.angle_limit <= 0.0 || !axis.is_roll_or_pitch() || !self.applies_to(axis) {
            return 0.0;
        }
        let excess = attitude_deg.abs() - self.angle_limit;
        if excess <= 0.0 {
            return 0.0;
        }
        // Push back toward the limit proportionally
        -attitude_deg.signum() * excess * 2.0
    }
}
