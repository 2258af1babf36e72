//! Thrust Linearization
//!
//! Propeller thrust is roughly quadratic in commanded output, so a fixed
//! PID sum moves the craft harder at high throttle than near idle. This
//! stage boosts low motor outputs by the configured factor and compensates
//! the collective throttle in the opposite direction so hover throttle
//! stays put. A separate term scales output against measured battery sag.

use openflight_profile::PidProfile;

/// State for the thrust-linearization stage. Pure function of the profile;
/// no per-tick state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustLinearization {
    /// Linearization strength, 0..1.5 from the profile percent.
    factor: f32,
    /// Pre-computed compensation strength for the throttle path.
    throttle_compensate_amount: f32,
    /// Battery-sag compensation strength, 0..1.5.
    vbat_sag_factor: f32,
}

impl ThrustLinearization {
    /// Derive from the profile; returns `None` when both features are off.
    pub fn new(profile: &PidProfile) -> Option<Self> {
        if profile.thrust_linearization == 0 && profile.vbat_sag_compensation == 0 {
            return None;
        }
        let factor = f32::from(profile.thrust_linearization) / 100.0;
        Some(Self {
            factor,
            throttle_compensate_amount: factor - 0.5 * factor * factor,
            vbat_sag_factor: f32::from(profile.vbat_sag_compensation) / 100.0,
        })
    }

    /// Boost an individual motor output (0..1) along the inverse thrust
    /// curve.
    pub fn apply(&self, motor_output: f32) -> f32 {
        if self.factor <= 0.0 || motor_output <= 0.0 {
            return motor_output;
        }
        let reversed = 1.0 - motor_output;
        motor_output * (1.0 + reversed * reversed * self.factor)
    }

    /// Compensate the collective throttle (0..1) so the boost does not
    /// shift the hover point.
    pub fn compensate(&self, throttle: f32) -> f32 {
        if self.factor <= 0.0 {
            return throttle;
        }
        let reversed = 1.0 - throttle;
        throttle / (1.0 + self.throttle_compensate_amount * reversed * reversed)
    }

    /// Scale a motor output up against measured battery sag.
    ///
    /// `sag_ratio` is 0 at nominal voltage and 1 at the full configured sag.
    pub fn compensate_sag(&self, motor_output: f32, sag_ratio: f32) -> f32 {
        if self.vbat_sag_factor <= 0.0 {
            return motor_output;
        }
        let sag_ratio = sag_ratio.clamp(0.0, 1.0);
        (motor_output * (1.0 + sag_ratio * self.vbat_sag_factor)).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openflight_profile::PidProfile;

    fn linearizer(percent: u8) -> Option<ThrustLinearization> {
        let mut profile = PidProfile::default();
        profile.thrust_linearization = percent;
        ThrustLinearization::new(&profile)
    }

    #[test]
    fn test_disabled_when_both_zero() {
        let profile = PidProfile::default();
        assert!(ThrustLinearization::new(&profile).is_none());
    }

    #[test]
    fn test_apply_boosts_low_output_most() {
        let Some(tl) = linearizer(40) else { return };
        let low = tl.apply(0.2) - 0.2;
        let high = tl.apply(0.8) - 0.8;
        assert!(low > high);
        assert!(high >= 0.0);
    }

    #[test]
    fn test_apply_endpoints_unchanged() {
        let Some(tl) = linearizer(40) else { return };
        assert!((tl.apply(0.0) - 0.0).abs() < 1e-6);
        assert!((tl.apply(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_compensate_counteracts_apply_near_hover() {
        let Some(tl) = linearizer(40) else { return };
        // Compensation keeps the shifted hover point close to the original
        let hover = 0.35;
        let round_trip = tl.apply(tl.compensate(hover));
        assert!((round_trip - hover).abs() < 0.05);
    }

    #[test]
    fn test_compensate_monotone() {
        let Some(tl) = linearizer(40) else { return };
        let mut prev = -1.0;
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            let out = tl.compensate(t);
            assert!(out >= prev);
            prev = out;
        }
    }

    #[test]
    fn test_sag_compensation() {
        let mut profile = PidProfile::default();
        profile.vbat_sag_compensation = 100;
        let Some(tl) = ThrustLinearization::new(&profile) else {
            return;
        };
        // No sag: unchanged; full sag: boosted, capped at 1.0
        assert!((tl.compensate_sag(0.5, 0.0) - 0.5).abs() < 1e-6);
        assert!(tl.compensate_sag(0.5, 1.0) > 0.5);
        assert!(tl.compensate_sag(0.9, 1.0) <= 1.0);
    }
}
