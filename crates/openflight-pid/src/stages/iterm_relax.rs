//! Iterm-Relax
//!
//! Suppresses integral accumulation while the sticks (or the gyro) are
//! moving fast, so quick flips do not wind the integrator up and bounce
//! back on exit. A per-axis low-pass tracks the setpoint; the distance
//! between the raw and filtered setpoint is the high-passed activity that
//! drives suppression.

use openflight_filters::Pt1State;
use openflight_profile::{ItermRelax, ItermRelaxType, XYZ_AXIS_COUNT};

use crate::axis::Axis;
use crate::consts::ITERM_RELAX_SETPOINT_THRESHOLD;

/// State for the iterm-relax stage.
#[derive(Debug, Clone, Copy)]
pub struct ItermRelaxState {
    windup_lpf: [Pt1State; XYZ_AXIS_COUNT],
    relax: ItermRelax,
    relax_type: ItermRelaxType,
}

impl ItermRelaxState {
    /// Create the stage from profile settings.
    ///
    /// `cutoff_hz` is the relax corner (default 15 Hz); `dt` the loop
    /// period.
    pub fn new(relax: ItermRelax, relax_type: ItermRelaxType, cutoff_hz: u8, dt: f32) -> Self {
        let lpf = Pt1State::new(f32::from(cutoff_hz), dt);
        Self {
            windup_lpf: [lpf; XYZ_AXIS_COUNT],
            relax,
            relax_type,
        }
    }

    /// Adjust the integral error rate for one axis.
    ///
    /// `iterm` is the current accumulator value (used by the incremental
    /// variants to let the integral shrink freely), `gyro_rate` the measured
    /// rate and `setpoint` the effective setpoint. Returns the error rate
    /// the integrator should consume this tick.
    pub fn apply(
        &mut self,
        axis: Axis,
        iterm: f32,
        gyro_rate: f32,
        setpoint: f32,
        iterm_error_rate: f32,
    ) -> f32 {
        let setpoint_lpf = self.windup_lpf[axis.index()].apply(setpoint);
        let setpoint_hpf = (setpoint - setpoint_lpf).abs();

        if self.relax == ItermRelax::Off {
            return iterm_error_rate;
        }
        if axis == Axis::Yaw && !self.relax.applies_to_yaw() {
            return iterm_error_rate;
        }

        let relax_factor = (1.0 - setpoint_hpf / ITERM_RELAX_SETPOINT_THRESHOLD).max(0.0);
        let is_decreasing_i =
            (iterm > 0.0 && iterm_error_rate < 0.0) || (iterm < 0.0 && iterm_error_rate > 0.0);

        if self.relax.is_incremental() && is_decreasing_i {
            // Error that unwinds the accumulator is never suppressed.
            return iterm_error_rate;
        }

        match self.relax_type {
            ItermRelaxType::Setpoint => iterm_error_rate * relax_factor,
            ItermRelaxType::Gyro => apply_deadband(setpoint_lpf - gyro_rate, setpoint_hpf),
        }
    }

    /// Reset filter state, e.g. on disarm.
    pub fn reset(&mut self) {
        for lpf in &mut self.windup_lpf {
            lpf.state = 0.0;
        }
    }
}

/// Zero values inside the deadband, shift the rest toward zero by its width.
fn apply_deadband(value: f32, deadband: f32) -> f32 {
    if value.abs() < deadband {
        0.0
    } else if value > 0.0 {
        value - deadband
    } else {
        value + deadband
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openflight_profile::{ItermRelax, ItermRelaxType};

    const DT_8K: f32 = 1.0 / 8000.0;

    fn state(relax: ItermRelax, relax_type: ItermRelaxType) -> ItermRelaxState {
        ItermRelaxState::new(relax, relax_type, 15, DT_8K)
    }

    #[test]
    fn test_relax_off_passes_error_through() {
        let mut s = state(ItermRelax::Off, ItermRelaxType::Setpoint);
        let out = s.apply(Axis::Roll, 0.0, 0.0, 500.0, 100.0);
        assert!((out - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_relax_steady_setpoint_no_suppression() {
        let mut s = state(ItermRelax::Rp, ItermRelaxType::Setpoint);
        // Let the low-pass settle on a constant setpoint
        let mut out = 0.0;
        for _ in 0..20000 {
            out = s.apply(Axis::Roll, 0.0, 0.0, 200.0, 50.0);
        }
        assert!((out - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_relax_fast_setpoint_suppresses() {
        let mut s = state(ItermRelax::Rp, ItermRelaxType::Setpoint);
        // Setpoint step straight to a large value: high-pass >> threshold
        let out = s.apply(Axis::Roll, 0.0, 0.0, 500.0, 100.0);
        assert!(out.abs() < 1.0);
    }

    #[test]
    fn test_relax_rp_leaves_yaw_alone() {
        let mut s = state(ItermRelax::Rp, ItermRelaxType::Setpoint);
        let out = s.apply(Axis::Yaw, 0.0, 0.0, 500.0, 100.0);
        assert!((out - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_relax_rpy_suppresses_yaw() {
        let mut s = state(ItermRelax::Rpy, ItermRelaxType::Setpoint);
        let out = s.apply(Axis::Yaw, 0.0, 0.0, 500.0, 100.0);
        assert!(out.abs() < 1.0);
    }

    #[test]
    fn test_relax_incremental_lets_iterm_unwind() {
        let mut s = state(ItermRelax::RpInc, ItermRelaxType::Setpoint);
        // Large positive accumulator, negative error: shrinking is free
        let out = s.apply(Axis::Roll, 300.0, 0.0, 500.0, -100.0);
        assert!((out - (-100.0)).abs() < 1e-6);
        // Growing is still suppressed
        let out = s.apply(Axis::Roll, 300.0, 0.0, 500.0, 100.0);
        assert!(out.abs() < 1.0);
    }

    #[test]
    fn test_relax_gyro_type_uses_tracking_error() {
        let mut s = state(ItermRelax::Rp, ItermRelaxType::Gyro);
        // Settled setpoint, gyro exactly tracking: no integral drive
        let mut out = 0.0;
        for _ in 0..20000 {
            out = s.apply(Axis::Roll, 0.0, 200.0, 200.0, 100.0);
        }
        assert!(out.abs() < 1.0);
    }

    #[test]
    fn test_apply_deadband() {
        assert!((apply_deadband(5.0, 10.0) - 0.0).abs() < 1e-9);
        assert!((apply_deadband(15.0, 10.0) - 5.0).abs() < 1e-9);
        assert!((apply_deadband(-15.0, 10.0) - (-5.0)).abs() < 1e-9);
    }
}
