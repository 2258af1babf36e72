//! Transient Error Boost
//!
//! Quadratic emphasis on large rate errors: the boosted error grows with
//! `error * |error|`, capped at a configured fraction of the raw error so
//! the boost shapes transients without ever dominating steady-state
//! behavior. Applied to the P input (roll/pitch and yaw separately) and,
//! with its own gain, to the D derivative.

use openflight_profile::PidProfile;

use crate::axis::Axis;

/// Derived boost gains for the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoostGains {
    /// Roll/pitch error boost gain.
    pub pr_gain: f32,
    /// Roll/pitch boost cap, fraction of the raw error.
    pub pr_limit: f32,
    /// Yaw error boost gain.
    pub yaw_gain: f32,
    /// Yaw boost cap, fraction of the raw error.
    pub yaw_limit: f32,
    /// D derivative boost gain.
    pub dterm_gain: f32,
    /// D boost cap, fraction of the raw derivative.
    pub dterm_limit: f32,
}

impl BoostGains {
    /// Derive the working gains from the profile. Profile gains are in
    /// thousandths; limits in percent.
    pub fn from_profile(profile: &PidProfile) -> Self {
        Self {
            pr_gain: f32::from(profile.emu_boost_pr) / 1000.0,
            pr_limit: f32::from(profile.emu_boost_limit_pr) / 100.0,
            yaw_gain: f32::from(profile.emu_boost_y) / 1000.0,
            yaw_limit: f32::from(profile.emu_boost_limit_y) / 100.0,
            dterm_gain: f32::from(profile.dterm_boost) / 1000.0,
            dterm_limit: f32::from(profile.dterm_boost_limit) / 100.0,
        }
    }

    /// Boosted P-input error for the given axis.
    pub fn boost_error(&self, axis: Axis, error: f32) -> f32 {
        if axis.is_roll_or_pitch() {
            boosted(error, self.pr_gain, self.pr_limit)
        } else {
            boosted(error, self.yaw_gain, self.yaw_limit)
        }
    }

    /// Boosted D derivative.
    pub fn boost_dterm(&self, delta: f32) -> f32 {
        boosted(delta, self.dterm_gain, self.dterm_limit)
    }
}

/// Quadratic boost with a proportional cap. Zero gain passes through.
fn boosted(value: f32, gain: f32, limit: f32) -> f32 {
    if gain <= 0.0 {
        return value;
    }
    let boost = value * value.abs() * gain;
    let cap = value.abs() * limit;
    value + boost.clamp(-cap, cap)
}
