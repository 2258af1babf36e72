//! Coefficient derivation
//!
//! Converts the integer profile gains into working floating-point
//! coefficients. Runs once per profile load or loop-rate change, never
//! during a tick; calling it twice with the same profile yields
//! bit-identical results.

use openflight_profile::{Pidf, PidProfile, XYZ_AXIS_COUNT};

use crate::consts::{DTERM_SCALE, FEEDFORWARD_SCALE, ITERM_SCALE, PTERM_SCALE};

/// Working per-axis gains.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidCoefficient {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain, per second.
    pub ki: f32,
    /// Derivative gain, per inverse second.
    pub kd: f32,
    /// Feedforward gain.
    pub kf: f32,
}

impl PidCoefficient {
    /// Derive working gains from an integer gain bank.
    pub fn from_pidf(pidf: &Pidf) -> Self {
        Self {
            kp: PTERM_SCALE * f32::from(pidf.p),
            ki: ITERM_SCALE * f32::from(pidf.i),
            kd: DTERM_SCALE * f32::from(pidf.d),
            kf: FEEDFORWARD_SCALE * f32::from(pidf.f) / 100.0,
        }
    }
}

/// Derive the three axis coefficient sets from a profile.
pub fn derive_coefficients(profile: &PidProfile) -> [PidCoefficient; XYZ_AXIS_COUNT] {
    [
        PidCoefficient::from_pidf(&profile.pid[0]),
        PidCoefficient::from_pidf(&profile.pid[1]),
        PidCoefficient::from_pidf(&profile.pid[2]),
    ]
}

/// Inverse of the iterm windup point.
///
/// A windup point of 100% disables saturation gating (factor 1.0); the
/// division is guarded so a profile at exactly 100 cannot blow up the
/// derivation.
pub fn windup_point_inverse(windup_point_percent: u8) -> f32 {
    let percent = u8::min(windup_point_percent, 100);
    if percent >= 100 {
        return 1.0;
    }
    1.0 / (1.0 - f32::from(percent) / 100.0)
}

/// Feedforward transition multiplier (`100/x`), 0 disables the ramp.
pub fn feed_forward_transition_factor(transition: u8) -> f32 {
    if transition == 0 {
        0.0
    } else {
        100.0 / f32::from(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openflight_profile::Pidf;

    #[test]
    fn test_coefficient_scales() {
        let coeff = PidCoefficient::from_pidf(&Pidf::new(30, 50, 20, 100));
        assert!((coeff.kp - PTERM_SCALE * 30.0).abs() < 1e-6);
        assert!((coeff.ki - ITERM_SCALE * 50.0).abs() < 1e-6);
        assert!((coeff.kd - DTERM_SCALE * 20.0).abs() < 1e-6);
        assert!((coeff.kf - FEEDFORWARD_SCALE).abs() < 1e-6);
    }

    #[test]
    fn test_derivation_idempotent() {
        let profile = PidProfile::default();
        let a = derive_coefficients(&profile);
        let b = derive_coefficients(&profile);
        assert_eq!(a, b);
    }

    #[test]
    fn test_windup_point_inverse() {
        assert!((windup_point_inverse(100) - 1.0).abs() < 1e-6);
        assert!((windup_point_inverse(50) - 2.0).abs() < 1e-6);
        assert!((windup_point_inverse(0) - 1.0).abs() < 1e-6);
        // Out-of-range input clamps instead of dividing by a negative
        assert!(windup_point_inverse(200).is_finite());
    }

    #[test]
    fn test_feed_forward_transition_factor() {
        assert!((feed_forward_transition_factor(0) - 0.0).abs() < 1e-9);
        assert!((feed_forward_transition_factor(50) - 2.0).abs() < 1e-6);
        assert!((feed_forward_transition_factor(100) - 1.0).abs() < 1e-6);
    }
}
