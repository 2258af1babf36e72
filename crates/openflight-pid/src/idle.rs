//! Idle Governor (minimum-RPM hold)
//!
//! A slow integrating controller that raises the minimum motor output when
//! measured RPM falls below the configured floor, keeping props spinning
//! authoritatively through throttle chops. Runs at its own cadence,
//! independent of the rate loop.

use openflight_profile::PidProfile;

/// State for the idle governor.
#[derive(Debug, Clone, Copy)]
pub struct IdleGovernor {
    /// RPM floor (profile value is hundreds of RPM).
    min_rpm: f32,
    p_gain: f32,
    /// Clamp on the proportional contribution, normalized output units.
    p_limit: f32,
    /// Integrator rate, normalized output units per RPM-error per second.
    adjustment_speed: f32,
    /// Clamp on the integrated correction, normalized output units.
    max_increase: f32,
    integral: f32,
}

impl IdleGovernor {
    /// Derive the governor from the profile; `None` when the RPM floor is 0.
    pub fn new(profile: &PidProfile) -> Option<Self> {
        if profile.idle_min_rpm == 0 {
            return None;
        }
        Some(Self {
            min_rpm: f32::from(profile.idle_min_rpm) * 100.0,
            p_gain: f32::from(profile.idle_p) * 0.0001,
            p_limit: f32::from(profile.idle_pid_limit) * 0.001,
            adjustment_speed: f32::from(profile.idle_adjustment_speed) * 0.0001,
            max_increase: f32::from(profile.idle_max_increase) * 0.001,
            integral: 0.0,
        })
    }

    /// Advance the governor by one of its own periods.
    ///
    /// `min_motor_rpm` is the slowest measured/estimated motor RPM; `dt`
    /// the governor period in seconds. Returns the throttle-floor increase
    /// in normalized output units, bounded by the configured limits.
    pub fn update(&mut self, min_motor_rpm: f32, dt: f32) -> f32 {
        let error_rpm = self.min_rpm - min_motor_rpm;

        // Integrator only winds up while below the floor; above it, it
        // bleeds back down at the same speed.
        self.integral = (self.integral + error_rpm * self.adjustment_speed * dt * 0.01)
            .clamp(0.0, self.max_increase);

        let p = (error_rpm * self.p_gain * 0.01).clamp(0.0, self.p_limit);
        (p + self.integral).min(self.max_increase)
    }

    /// Current integrated correction.
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Zero the integrator, e.g. on disarm.
    pub fn reset(&mut self) {
        self.integral = 0.0;
    }
}
