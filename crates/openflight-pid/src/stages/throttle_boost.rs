//! Throttle Boost
//!
//! Adds a high-passed copy of the throttle back onto the throttle so quick
//! throttle stabs reach the motors harder than the RC smoothing would
//! otherwise allow. The boosted value feeds the external mixer's throttle
//! path; steady throttle is unaffected.

use openflight_filters::Pt1State;
use openflight_profile::PidProfile;

/// State for the throttle-boost stage.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleBoostState {
    lpf: Pt1State,
    /// Boost strength; profile value 100 adds 10x the high-passed throttle.
    factor: f32,
}

impl ThrottleBoostState {
    /// Derive the stage from the profile; `None` when the boost is off.
    pub fn new(profile: &PidProfile, dt: f32) -> Option<Self> {
        if profile.throttle_boost == 0 {
            return None;
        }
        Some(Self {
            lpf: Pt1State::new(f32::from(profile.throttle_boost_cutoff), dt),
            factor: f32::from(profile.throttle_boost) / 10.0,
        })
    }

    /// Boosted throttle, clamped to `[0, 1]`.
    pub fn apply(&mut self, throttle: f32) -> f32 {
        let hpf = throttle - self.lpf.apply(throttle);
        (throttle + hpf * self.factor).clamp(0.0, 1.0)
    }

    /// Reset the filter, e.g. on disarm.
    pub fn reset(&mut self) {
        self.lpf.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openflight_profile::PidProfile;

    const DT_8K: f32 = 1.0 / 8000.0;

    fn boost() -> Option<ThrottleBoostState> {
        ThrottleBoostState::new(&PidProfile::default(), DT_8K)
    }

    #[test]
    fn test_disabled_at_zero() {
        let mut profile = PidProfile::default();
        profile.throttle_boost = 0;
        assert!(ThrottleBoostState::new(&profile, DT_8K).is_none());
    }

    #[test]
    fn test_steady_throttle_unboosted() {
        let Some(mut s) = boost() else { return };
        let mut out = 0.0;
        for _ in 0..20000 {
            out = s.apply(0.5);
        }
        assert!((out - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_step_boosted_then_settles() {
        let Some(mut s) = boost() else { return };
        for _ in 0..20000 {
            s.apply(0.2);
        }
        let stabbed = s.apply(0.6);
        assert!(stabbed > 0.6);
        for _ in 0..20000 {
            s.apply(0.6);
        }
        let settled = s.apply(0.6);
        assert!((settled - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_output_clamped() {
        let Some(mut s) = boost() else { return };
        for _ in 0..1000 {
            s.apply(0.0);
        }
        let out = s.apply(1.0);
        assert!(out <= 1.0);
        for _ in 0..1000 {
            s.apply(1.0);
        }
        let out = s.apply(0.0);
        assert!(out >= 0.0);
    }
}
