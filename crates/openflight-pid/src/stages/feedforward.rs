//! Feedforward
//!
//! The F term anticipates control effort from the setpoint derivative
//! instead of waiting for rate error to develop. RC setpoints arrive in
//! coarse steps well below the loop rate, so the derivative is optionally
//! rebuilt from interpolated setpoint deltas, smoothed, boosted by a
//! high-passed component for extra kick on sharp inputs, and ramped in by
//! stick deflection so it cannot dominate around center.

use openflight_filters::Pt1State;
use openflight_profile::{FfInterpolation, PidProfile, XYZ_AXIS_COUNT};

use crate::axis::Axis;
use crate::coefficients::feed_forward_transition_factor;
use crate::consts::SETPOINT_RATE_LIMIT;

/// High-pass corner for the feedforward boost component, Hz.
const FF_BOOST_LPF_HZ: f32 = 70.0;

/// State for the feedforward stage.
#[derive(Debug, Clone, Copy)]
pub struct FeedforwardState {
    interpolation: FfInterpolation,
    transition_factor: f32,
    boost_factor: f32,
    smooth_factor: f32,
    max_rate_limit: f32,
    prev_setpoint: [f32; XYZ_AXIS_COUNT],
    prev_delta: [f32; XYZ_AXIS_COUNT],
    delta_window: [[f32; 4]; XYZ_AXIS_COUNT],
    window_index: [usize; XYZ_AXIS_COUNT],
    boost_lpf: [Pt1State; XYZ_AXIS_COUNT],
    dt: f32,
}

impl FeedforwardState {
    /// Derive the stage from the profile.
    pub fn from_profile(profile: &PidProfile, dt: f32) -> Self {
        Self {
            interpolation: profile.ff_interpolate_sp,
            transition_factor: feed_forward_transition_factor(profile.feed_forward_transition),
            boost_factor: f32::from(profile.ff_boost) / 10.0,
            smooth_factor: 1.0 - f32::from(profile.ff_smooth_factor) / 100.0,
            max_rate_limit: f32::from(profile.ff_max_rate_limit) / 100.0,
            prev_setpoint: [0.0; XYZ_AXIS_COUNT],
            prev_delta: [0.0; XYZ_AXIS_COUNT],
            delta_window: [[0.0; 4]; XYZ_AXIS_COUNT],
            window_index: [0; XYZ_AXIS_COUNT],
            boost_lpf: [Pt1State::new(FF_BOOST_LPF_HZ, dt); XYZ_AXIS_COUNT],
            dt,
        }
    }

    /// Configured boost factor (telemetry accessor).
    pub fn boost_factor(&self) -> f32 {
        self.boost_factor
    }

    /// Configured smoothing factor (telemetry accessor).
    pub fn smooth_factor(&self) -> f32 {
        self.smooth_factor
    }

    /// Feedforward rate (deg/s/s before `Kf`) for one axis this tick.
    ///
    /// `stick_deflection` in `[-1, 1]` drives the transition ramp.
    pub fn apply(&mut self, axis: Axis, setpoint: f32, stick_deflection: f32) -> f32 {
        let i = axis.index();
        let raw_delta = (setpoint - self.prev_setpoint[i]) / self.dt;
        self.prev_setpoint[i] = setpoint;

        let mut delta = match self.interpolation {
            FfInterpolation::Off => raw_delta,
            _ => {
                // Smooth the per-tick steps of the interpolated setpoint
                let smoothed =
                    self.prev_delta[i] + (raw_delta - self.prev_delta[i]) * self.smooth_factor;
                self.prev_delta[i] = smoothed;

                let window = self.interpolation.window();
                if window > 1 {
                    self.delta_window[i][self.window_index[i] % window] = smoothed;
                    self.window_index[i] = (self.window_index[i] + 1) % window;
                    let sum: f32 = self.delta_window[i][..window].iter().sum();
                    sum / window as f32
                } else {
                    smoothed
                }
            }
        };

        if self.boost_factor > 0.0 {
            // High-passed delta adds kick on sharp inputs and fades on
            // sustained ramps
            let hpf = delta - self.boost_lpf[i].apply(delta);
            delta += hpf * self.boost_factor;
        }

        // Ramp feedforward in with stick deflection
        if self.transition_factor > 0.0 {
            let ramp = (stick_deflection.abs() * self.transition_factor).min(1.0);
            delta *= ramp;
        }

        // Never push the setpoint past the configured fraction of max rate
        if self.max_rate_limit > 0.0 {
            let rate_cap = SETPOINT_RATE_LIMIT * self.max_rate_limit;
            if setpoint.abs() >= rate_cap && setpoint * delta > 0.0 {
                delta = 0.0;
            }
        }

        delta
    }

    /// Reset per-axis history, e.g. on disarm.
    pub fn reset(&mut self) {
        self.prev_setpoint = [0.0; XYZ_AXIS_COUNT];
        self.prev_delta = [0.0; XYZ_AXIS_COUNT];
        self.delta_window = [[0.0; 4]; XYZ_AXIS_COUNT];
        self.window_index = [0; XYZ_AXIS_COUNT];
        for lpf in &mut self.boost_lpf {
            lpf.state = 0.0;
        }
    }
}
