//! Absolute Control
//!
//! Integrates the rate error into a per-axis attitude-error estimate and
//! feeds a bounded correction back into the effective setpoint. This keeps
//! correcting steady offsets even while iterm-relax is suppressing the
//! normal integrator during stick movement.

use openflight_filters::Pt1State;
use openflight_profile::XYZ_AXIS_COUNT;

use crate::axis::Axis;

/// Tuning for absolute control. The persisted profile carries no fields for
/// this stage; it is configured at derivation time and disabled by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsoluteControlConfig {
    /// Correction per degree of accumulated error (0 disables the stage).
    pub gain: f32,
    /// Clamp on the setpoint correction, deg/s.
    pub limit: f32,
    /// Clamp on the accumulated error, deg.
    pub error_limit: f32,
    /// Cutoff of the setpoint low-pass used to build the expected gyro
    /// response window, Hz.
    pub cutoff_hz: f32,
}

impl Default for AbsoluteControlConfig {
    fn default() -> Self {
        Self {
            gain: 0.0,
            limit: 90.0,
            error_limit: 20.0,
            cutoff_hz: 12.0,
        }
    }
}

/// State for the absolute-control stage.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteControlState {
    lpf: [Pt1State; XYZ_AXIS_COUNT],
    axis_error: [f32; XYZ_AXIS_COUNT],
    gain: f32,
    limit: f32,
    error_limit: f32,
    dt: f32,
}

impl AbsoluteControlState {
    /// Create the stage; returns `None` when the gain disables it.
    pub fn new(config: &AbsoluteControlConfig, dt: f32) -> Option<Self> {
        if config.gain <= 0.0 {
            return None;
        }
        let lpf = Pt1State::new(config.cutoff_hz, dt);
        Some(Self {
            lpf: [lpf; XYZ_AXIS_COUNT],
            axis_error: [0.0; XYZ_AXIS_COUNT],
            gain: config.gain,
            limit: config.limit,
            error_limit: config.error_limit,
            dt,
        })
    }

    /// Advance the error estimate for one axis and return the setpoint
    /// correction. The caller adds the correction to both the effective
    /// setpoint and the integral error rate.
    pub fn correction(&mut self, axis: Axis, gyro_rate: f32, setpoint: f32) -> f32 {
        let i = axis.index();
        let setpoint_lpf = self.lpf[i].apply(setpoint);
        let setpoint_hpf = (setpoint - setpoint_lpf).abs();

        // Window of gyro rates considered a correct response to the stick;
        // only deviation outside it accumulates as attitude error.
        let g_max = setpoint_lpf + 2.0 * setpoint_hpf;
        let g_min = setpoint_lpf - 2.0 * setpoint_hpf;
        let error_rate = if gyro_rate < g_min {
            g_min - gyro_rate
        } else if gyro_rate > g_max {
            g_max - gyro_rate
        } else {
            0.0
        };

        self.axis_error[i] = (self.axis_error[i] + error_rate * self.dt)
            .clamp(-self.error_limit, self.error_limit);

        (self.axis_error[i] * self.gain).clamp(-self.limit, self.limit)
    }

    /// Accumulated attitude error, deg (exposed for iterm rotation).
    pub fn axis_error_mut(&mut self) -> &mut [f32; XYZ_AXIS_COUNT] {
        &mut self.axis_error
    }

    /// Zero the accumulated error and filters.
    pub fn reset(&mut self) {
        self.axis_error = [0.0; XYZ_AXIS_COUNT];
        for lpf in &mut self.lpf {
            lpf.state = 0.0;
        }
    }
}
