//! Angle / Horizon Blending
//!
//! In angle mode the stick commands an attitude, not a rate; this stage
//! turns the attitude error into an effective rate setpoint using two gain
//! banks faded by error magnitude (a soft bank for small corrections, a
//! firm bank for large recoveries). In horizon mode the leveling strength
//! fades with stick deflection so the craft hands off smoothly from
//! self-leveling to acro as the pilot takes over.

use openflight_profile::{PidProfile, Pidf};

use crate::axis::Axis;
use crate::consts::LEVEL_FADE_BASE_DEG;

const LEVEL_P_SCALE: f32 = 0.1;
const LEVEL_D_SCALE: f32 = 0.00017;

/// State for the angle/horizon stage.
#[derive(Debug, Clone, Copy)]
pub struct LevelState {
    p_angle_low: f32,
    d_angle_low: f32,
    p_angle_high: f32,
    d_angle_high: f32,
    horizon_gain: f32,
    horizon_cutoff_degrees: f32,
    horizon_factor_ratio: f32,
    horizon_tilt_effect: f32,
    racemode_horizon: bool,
    nfe_racemode: bool,
    angle_limit: f32,
    angle_expo: f32,
    previous_angle: [f32; 2],
    dt: f32,
}

impl LevelState {
    /// Derive the stage from the profile's level banks and horizon fields.
    pub fn from_profile(profile: &PidProfile, dt: f32) -> Self {
        let fade = |bank: &Pidf| {
            (
                f32::from(bank.p) * LEVEL_P_SCALE,
                f32::from(bank.d) * LEVEL_D_SCALE,
            )
        };
        let (p_low, d_low) = fade(&profile.pid_level_low);
        let (p_high, d_high) = fade(&profile.pid_level_high);

        Self {
            p_angle_low: p_low,
            d_angle_low: d_low,
            p_angle_high: p_high,
            d_angle_high: d_high,
            horizon_gain: f32::from(profile.horizon_gain) / 50.0,
            horizon_cutoff_degrees: (LEVEL_FADE_BASE_DEG - f32::from(profile.horizon_transition))
                * 6.0
                / 10.0,
            horizon_factor_ratio: (100.0 - f32::from(profile.horizon_transition)) / 100.0,
            horizon_tilt_effect: f32::from(profile.racemode_tilt_effect),
            racemode_horizon: profile.racemode_horizon,
            nfe_racemode: profile.nfe_racemode,
            angle_limit: f32::from(profile.level_angle_limit),
            angle_expo: f32::from(profile.angle_expo) / 100.0,
            previous_angle: [0.0; 2],
            dt,
        }
    }

    /// Stick curve for the commanded angle: linear blended into cubic by
    /// the configured expo.
    fn stick_curve(&self, deflection: f32) -> f32 {
        let deflection = deflection.clamp(-1.0, 1.0);
        let cubed = deflection * deflection * deflection;
        deflection + (cubed - deflection) * self.angle_expo
    }

    /// Leveling strength in horizon mode, `[0, 1]`.
    ///
    /// Fades out with stick deflection (scaled by the transition setting)
    /// and, through the tilt effect, with how far the craft is already
    /// leaned over.
    pub fn horizon_level_strength(&self, max_stick_deflection: f32, current_tilt_deg: f32) -> f32 {
        let stick = max_stick_deflection.abs().clamp(0.0, 1.0);
        let mut strength = (1.0 - stick * self.horizon_factor_ratio).max(0.0);

        if self.horizon_tilt_effect > 0.0 {
            let tilt_fade = 1.0 - (current_tilt_deg.abs() / self.horizon_tilt_effect).min(1.0);
            strength *= tilt_fade;
        }
        (strength * self.horizon_gain).clamp(0.0, 1.0)
    }

    /// Effective rate setpoint for a leveled axis.
    ///
    /// `stick_deflection` is the pilot input in `[-1, 1]`, `attitude_deg`
    /// the current lean on this axis, `max_stick_deflection` the larger of
    /// the two stick magnitudes (horizon fade input), `tilt_deg` the
    /// overall lean (tilt-effect input) and `current_setpoint` the rate the
    /// sticks would command in acro.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &mut self,
        axis: Axis,
        stick_deflection: f32,
        attitude_deg: f32,
        max_stick_deflection: f32,
        tilt_deg: f32,
        current_setpoint: f32,
        angle_mode: bool,
        horizon_mode: bool,
    ) -> f32 {
        if axis == Axis::Yaw {
            return current_setpoint;
        }
        // NFE race mode: pitch stays gyro-based
        if self.nfe_racemode && axis == Axis::Pitch {
            return current_setpoint;
        }
        // Racemode horizon levels roll only
        if horizon_mode && self.racemode_horizon && axis == Axis::Pitch {
            return current_setpoint;
        }

        let target_angle = self.angle_limit * self.stick_curve(stick_deflection);
        let error_angle = target_angle - attitude_deg;

        // Fade between the soft and firm banks by error magnitude
        let fade = (error_angle.abs() / self.horizon_cutoff_degrees).clamp(0.0, 1.0);
        let p_gain = self.p_angle_low + (self.p_angle_high - self.p_angle_low) * fade;
        let d_gain = self.d_angle_low + (self.d_angle_high - self.d_angle_low) * fade;

        let idx = axis.index();
        let angle_derivative = (attitude_deg - self.previous_angle[idx]) / self.dt;
        self.previous_angle[idx] = attitude_deg;

        let angle_rate = error_angle * p_gain - angle_derivative * d_gain;

        if angle_mode {
            angle_rate
        } else {
            // Horizon: blend the leveling rate on top of the acro setpoint
            let strength = self.horizon_level_strength(max_stick_deflection, tilt_deg);
            current_setpoint + angle_rate * strength
        }
    }

    /// Previous attitude sample for a leveled axis, deg.
    pub fn previous_angle(&self, axis: Axis) -> f32 {
        if axis == Axis::Yaw {
            0.0
        } else {
            self.previous_angle[axis.index()]
        }
    }

    /// Reset attitude history, e.g. on disarm.
    pub fn reset(&mut self) {
        self.previous_angle = [0.0; 2];
    }
}
