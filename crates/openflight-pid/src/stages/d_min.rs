//! D-Min
//!
//! Floors the derivative gain during quiet flight so the D term amplifies
//! less noise, and raises it back toward the full profile gain when gyro or
//! stick activity indicates a maneuver that needs derivative authority.

use openflight_filters::{BiquadState, Pt1State};
use openflight_profile::{PidProfile, XYZ_AXIS_COUNT};

use crate::axis::Axis;
use crate::consts::{
    D_MIN_GAIN_FACTOR, D_MIN_LOWPASS_HZ, D_MIN_RANGE_HZ, D_MIN_SETPOINT_GAIN_FACTOR,
};

/// State for the D-min stage.
#[derive(Debug, Clone, Copy)]
pub struct DMinState {
    range: [BiquadState; XYZ_AXIS_COUNT],
    lowpass: [Pt1State; XYZ_AXIS_COUNT],
    /// Gain floor as a fraction of the full D gain, per axis (0 disables).
    percent: [f32; XYZ_AXIS_COUNT],
    gyro_gain: f32,
    setpoint_gain: f32,
}

impl DMinState {
    /// Create the stage; returns `None` when no axis has a D-min floor.
    pub fn new(profile: &PidProfile, pid_frequency: f32, dt: f32) -> Option<Self> {
        let mut percent = [0.0; XYZ_AXIS_COUNT];
        let mut any = false;
        for i in 0..XYZ_AXIS_COUNT {
            let d_min = f32::from(profile.d_min[i]);
            let d = f32::from(profile.pid[i].d);
            if d_min > 0.0 && d_min < d {
                percent[i] = d_min / d;
                any = true;
            }
        }
        if !any {
            return None;
        }

        let gyro_gain = f32::from(profile.d_min_gain) * D_MIN_GAIN_FACTOR / D_MIN_LOWPASS_HZ;
        let setpoint_gain = f32::from(profile.d_min_gain)
            * D_MIN_SETPOINT_GAIN_FACTOR
            * f32::from(profile.d_min_advance)
            * pid_frequency
            / (100.0 * D_MIN_LOWPASS_HZ);

        Some(Self {
            range: [BiquadState::lowpass(D_MIN_RANGE_HZ, pid_frequency); XYZ_AXIS_COUNT],
            lowpass: [Pt1State::new(D_MIN_LOWPASS_HZ, dt); XYZ_AXIS_COUNT],
            percent,
            gyro_gain,
            setpoint_gain,
        })
    }

    /// Pure mapping from activity to the gain factor, in `[percent, 1]`,
    /// monotone non-decreasing in both activity measures.
    fn activity_factor(percent: f32, gyro_factor: f32, setpoint_factor: f32) -> f32 {
        let activity = gyro_factor.max(setpoint_factor);
        (percent + (1.0 - percent) * activity).min(1.0)
    }

    /// D gain factor for one axis this tick, in `[d_min/d, 1]`.
    ///
    /// `delta` is the unscaled D-term derivative (deg/s/s) and `setpoint`
    /// the effective setpoint (deg/s).
    pub fn factor(&mut self, axis: Axis, delta: f32, setpoint: f32) -> f32 {
        let i = axis.index();
        let percent = self.percent[i];
        if percent <= 0.0 {
            return 1.0;
        }

        let gyro_factor = self.range[i].apply(delta).abs() * self.gyro_gain;
        let setpoint_factor = setpoint.abs() * self.setpoint_gain;
        let factor = Self::activity_factor(percent, gyro_factor, setpoint_factor);
        self.lowpass[i].apply(factor).min(1.0)
    }

    /// Gain floor fraction for an axis (0 when D-min is off there).
    pub fn percent(&self, axis: Axis) -> f32 {
        self.percent[axis.index()]
    }

    /// Reset the activity filters, e.g. on disarm. The smoothed factor
    /// restarts at the floor rather than zero so the first ticks do not
    /// announce a phantom maneuver.
    pub fn reset(&mut self) {
        for i in 0..XYZ_AXIS_COUNT {
            self.range[i] = BiquadState {
                x1: 0.0,
                x2: 0.0,
                y1: 0.0,
                y2: 0.0,
                ..self.range[i]
            };
            self.lowpass[i].state = self.percent[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openflight_profile::PidProfile;

    const DT_8K: f32 = 1.0 / 8000.0;

    fn d_min_state() -> Option<DMinState> {
        DMinState::new(&PidProfile::default(), 8000.0, DT_8K)
    }

    #[test]
    fn test_default_profile_enables_d_min() {
        assert!(d_min_state().is_some());
    }

    #[test]
    fn test_disabled_when_no_floor() {
        let mut profile = PidProfile::default();
        profile.d_min = [0, 0, 0];
        assert!(DMinState::new(&profile, 8000.0, DT_8K).is_none());
    }

    #[test]
    fn test_activity_factor_bounds() {
        for activity in [0.0, 0.2, 0.5, 1.0, 5.0] {
            let f = DMinState::activity_factor(0.6, activity, 0.0);
            assert!(f >= 0.6 && f <= 1.0);
        }
    }

    #[test]
    fn test_activity_factor_monotone() {
        let mut prev = 0.0;
        for i in 0..=50 {
            let activity = i as f32 / 25.0;
            let f = DMinState::activity_factor(0.6, activity, 0.0);
            assert!(f >= prev);
            prev = f;
        }
    }

    #[test]
    fn test_quiet_flight_factor_at_floor() {
        let Some(mut s) = d_min_state() else { return };
        let floor = s.percent(Axis::Roll);
        let mut factor = 1.0;
        for _ in 0..8000 {
            factor = s.factor(Axis::Roll, 0.0, 0.0);
        }
        assert!((factor - floor).abs() < 1e-2, "factor {factor} vs floor {floor}");
    }

    #[test]
    fn test_aggressive_setpoint_raises_factor() {
        let Some(mut s) = d_min_state() else { return };
        let floor = s.percent(Axis::Roll);
        let mut factor = 0.0;
        for _ in 0..8000 {
            factor = s.factor(Axis::Roll, 0.0, 500.0);
        }
        assert!(factor > floor + 0.1);
        assert!(factor <= 1.0);
    }

    #[test]
    fn test_factor_never_exceeds_one() {
        let Some(mut s) = d_min_state() else { return };
        for _ in 0..1000 {
            let f = s.factor(Axis::Roll, 1e6, 1e6);
            assert!(f <= 1.0);
        }
    }

    #[test]
    fn test_axis_without_floor_passes_full_gain() {
        // Default profile: yaw d_min = 0
        let Some(mut s) = d_min_state() else { return };
        let f = s.factor(Axis::Yaw, 1000.0, 1000.0);
        assert!((f - 1.0).abs() < 1e-9);
    }
}
