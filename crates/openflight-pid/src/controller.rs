//! Per-Axis Control Loop
//!
//! One call to [`PidRuntime::run_control_loop`] executes the whole tick:
//! for each axis the effective setpoint is shaped (acceleration limit,
//! angle/horizon blend, launch-control hold), the integral path is adjusted
//! (iterm-relax, absolute control, anti-gravity, windup gating, decay,
//! rotation), the derivative is filtered and gain-scheduled (notch chain,
//! low-pass chain, D-min, boost), feedforward is derived from the setpoint,
//! and the bounded sum is produced for the external mixer.
//!
//! Stage order is fixed and load-bearing: relax and absolute control run
//! before the integral advances; the D-min activity measure is computed
//! before the P boost and D gain consume it; anti-gravity multiplies I
//! after the baseline integral step.
//!
//! The loop is non-reentrant and run-to-completion; nothing in here blocks,
//! allocates or returns an error. Numeric defects are sanitized and counted
//! instead.

use openflight_filters::dyn_lpf_cutoff_hz;
use openflight_profile::{AntiGravityMode, DynNotchLocation, XYZ_AXIS_COUNT};
use tracing::debug;

use crate::axis::{Axis, PidAxisData};
use crate::error::RtFault;
use crate::runtime::PidRuntime;
use crate::stages::rotate_vector;

const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

/// Externally supplied values for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Commanded rates, deg/s (roll, pitch, yaw).
    pub setpoint: [f32; XYZ_AXIS_COUNT],
    /// Filtered gyro rates, deg/s.
    pub gyro: [f32; XYZ_AXIS_COUNT],
    /// Current attitude, deg (roll, pitch); yaw slot unused by the loop.
    pub attitude: [f32; XYZ_AXIS_COUNT],
    /// Stick deflection per axis, `[-1, 1]`.
    pub rc_deflection: [f32; XYZ_AXIS_COUNT],
    /// Normalized throttle, `[0, 1]`.
    pub throttle: f32,
    /// Mixer saturation measure from the previous tick, `[0, 1]`.
    pub motor_mix_range: f32,
    /// Angle (self-level) mode engaged.
    pub angle_mode: bool,
    /// Horizon (blended) mode engaged.
    pub horizon_mode: bool,
    /// Craft is armed.
    pub armed: bool,
    /// Airmode holds the integral alive at zero throttle.
    pub airmode_active: bool,
    /// Throttle stick at its low stop.
    pub zero_throttle: bool,
}

impl PidRuntime {
    /// Execute one full tick across all axes.
    ///
    /// Must be called at the fixed tick rate the runtime was derived for.
    /// Returns the per-axis outputs; they remain readable through
    /// [`PidRuntime::axis_data`] until the next tick overwrites them.
    pub fn run_control_loop(&mut self, input: &TickInput) -> &[PidAxisData; XYZ_AXIS_COUNT] {
        let input = self.sanitize(input);

        if !self.stabilisation_enabled {
            // Forced-zero outputs; the accumulator does not survive either.
            self.iterm = [0.0; XYZ_AXIS_COUNT];
            for data in &mut self.axis_data {
                data.zero();
            }
            return &self.axis_data;
        }

        self.rotate_accumulators(&input);

        let iterm_accelerator = self.anti_gravity.update(input.throttle);

        // Mixer saturation gates integral accumulation past the windup point
        let dyn_ci = self.dt
            * if self.windup_point_inv > 1.0 {
                ((1.0 - input.motor_mix_range) * self.windup_point_inv).clamp(0.0, 1.0)
            } else {
                1.0
            };

        let launch_active = self.launch_control.is_active();
        let max_stick = input.rc_deflection[0].abs().max(input.rc_deflection[1].abs());
        let tilt = input.attitude[0].abs().max(input.attitude[1].abs());

        let mut worst_delta = 0.0f32;
        let mut worst_gyro = 0.0f32;
        let mut worst_setpoint = 0.0f32;

        for axis in Axis::ALL {
            let i = axis.index();
            let gyro_rate = input.gyro[i];
            let mut current_setpoint = input.setpoint[i];

            if self.max_velocity[i] > 0.0 {
                current_setpoint = self.acceleration_limit(i, current_setpoint);
            }

            if (input.angle_mode || input.horizon_mode) && axis.is_roll_or_pitch() {
                current_setpoint = self.level.apply(
                    axis,
                    input.rc_deflection[i],
                    input.attitude[i],
                    max_stick,
                    tilt,
                    current_setpoint,
                    input.angle_mode && !input.horizon_mode,
                    input.horizon_mode,
                );
            }

            if launch_active {
                // Holding for launch: pilot rates are ignored, only the
                // attitude clamp commands movement.
                current_setpoint = if axis.is_roll_or_pitch() {
                    self.launch_control.attitude_correction(axis, input.attitude[i])
                } else {
                    0.0
                };
            }

            let mut iterm_error_rate = current_setpoint - gyro_rate;
            if let Some(relax) = self.iterm_relax.as_mut() {
                iterm_error_rate = relax.apply(
                    axis,
                    self.iterm[i],
                    gyro_rate,
                    current_setpoint,
                    iterm_error_rate,
                );
            }
            if let Some(ac) = self.absolute_control.as_mut() {
                let correction = ac.correction(axis, gyro_rate, current_setpoint);
                current_setpoint += correction;
                iterm_error_rate += correction;
            }

            let error_rate = current_setpoint - gyro_rate;

            // ---- D source and filter chain (activity feeds D-min next)
            let measurement_delta = -(gyro_rate - self.previous_gyro_dterm[i]) / self.dt;
            self.previous_gyro_dterm[i] = gyro_rate;
            let error_delta = (error_rate - self.previous_error[i]) / self.dt;
            self.previous_error[i] = error_rate;

            let slider = self.dterm_measurement_slider;
            let mut delta = measurement_delta * slider + error_delta * (1.0 - slider);

            if let Some(bank) = self.dyn_notch.as_mut() {
                if bank.location == DynNotchLocation::PreFilter {
                    delta = bank.filters[i].apply(delta);
                }
            }
            if let Some(notch) = self.dterm_notch.as_mut() {
                delta = notch[i].apply(delta);
            }
            delta = self.dterm_lowpass[i].apply(delta);
            delta = if let Some(dynlpf2) = self.dterm_dynlpf2.as_mut() {
                dynlpf2[i].apply(delta, input.throttle)
            } else {
                self.dterm_lowpass2[i].apply(delta)
            };
            if let Some(bank) = self.dyn_notch.as_mut() {
                if bank.location == DynNotchLocation::PostFilter {
                    delta = bank.filters[i].apply(delta);
                }
            }

            let d_min_factor = match self.d_min.as_mut() {
                Some(d_min) => d_min.factor(axis, delta, current_setpoint),
                None => 1.0,
            };

            // ---- P
            let boosted_error = self.boost.boost_error(axis, error_rate);
            let mut p = self.coefficient[i].kp * boosted_error;
            if axis == Axis::Yaw {
                if let Some(lpf) = self.pterm_yaw_lowpass.as_mut() {
                    p = lpf.apply(p);
                }
            }

            // ---- I (baseline step, then decay; accelerator from above)
            let (ki, integral_error) = if launch_active {
                (
                    self.launch_control.ki(),
                    self.launch_control.iterm_error(axis, iterm_error_rate),
                )
            } else {
                (self.coefficient[i].ki, iterm_error_rate)
            };
            let mut iterm_new = self.iterm[i] + ki * iterm_accelerator * dyn_ci * integral_error;
            if self.i_decay > 0.0 && gyro_rate.abs() < self.i_decay_cutoff {
                iterm_new -= iterm_new * self.i_decay * self.dt;
            }
            if self.iterm_reset {
                iterm_new = 0.0;
            }
            self.iterm[i] = iterm_new.clamp(-self.iterm_limit, self.iterm_limit);

            // ---- D
            let boosted_delta = self.boost.boost_dterm(delta);
            let d = self.coefficient[i].kd * d_min_factor * boosted_delta;

            // ---- F
            let ff_delta = self
                .feedforward
                .apply(axis, current_setpoint, input.rc_deflection[i]);
            let f = self.coefficient[i].kf * ff_delta;

            worst_delta = worst_delta.max(delta.abs());
            worst_gyro = worst_gyro.max(gyro_rate.abs());
            worst_setpoint = worst_setpoint.max(current_setpoint.abs());

            // ---- Sum
            let data = &mut self.axis_data[i];
            data.p = p;
            data.i = self.iterm[i];
            data.d = d;
            data.f = f;
            let sum_raw = p + data.i + d + f;
            let limit = if axis == Axis::Yaw {
                self.sum_limit_yaw
            } else {
                self.sum_limit
            };
            if sum_raw.is_finite() {
                data.sum_raw = sum_raw;
                data.sum = sum_raw.clamp(-limit, limit);
            } else {
                data.zero();
                self.faults.record(RtFault::OutputNotFinite);
            }

            // Zero-throttle suppression: without airmode or the
            // min-throttle option, the axis output is forced to zero
            if input.zero_throttle && !self.pid_at_min_throttle && !input.airmode_active {
                data.zero();
            }

            self.previous_setpoint[i] = current_setpoint;
        }

        if input.armed {
            self.crash.update(worst_delta, worst_gyro, worst_setpoint);
        }

        &self.axis_data
    }

    /// Setpoint acceleration limiting: the effective setpoint may move at
    /// most `max_velocity` per tick.
    fn acceleration_limit(&mut self, index: usize, current_setpoint: f32) -> f32 {
        let velocity = current_setpoint - self.previous_setpoint[index];
        let max_velocity = self.max_velocity[index];
        if velocity.abs() > max_velocity {
            self.previous_setpoint[index] + max_velocity * velocity.signum()
        } else {
            current_setpoint
        }
    }

    /// Keep accumulated vectors expressed in the current body frame.
    fn rotate_accumulators(&mut self, input: &TickInput) {
        if !self.iterm_rotation_enabled && self.absolute_control.is_none() {
            return;
        }
        let gyro_to_angle = self.dt * DEG_TO_RAD;
        let rotation = [
            input.gyro[0] * gyro_to_angle,
            input.gyro[1] * gyro_to_angle,
            input.gyro[2] * gyro_to_angle,
        ];
        if self.iterm_rotation_enabled {
            rotate_vector(&mut self.iterm, rotation);
        }
        if let Some(ac) = self.absolute_control.as_mut() {
            rotate_vector(ac.axis_error_mut(), rotation);
        }
    }

    /// Replace non-finite inputs with zeros, counting each occurrence.
    fn sanitize(&mut self, input: &TickInput) -> TickInput {
        let mut clean = *input;
        let mut fault = false;
        for values in [
            &mut clean.setpoint,
            &mut clean.gyro,
            &mut clean.attitude,
            &mut clean.rc_deflection,
        ] {
            for value in values.iter_mut() {
                if !value.is_finite() {
                    *value = 0.0;
                    fault = true;
                }
            }
        }
        if !clean.throttle.is_finite() {
            clean.throttle = 0.0;
            fault = true;
        }
        clean.throttle = clean.throttle.clamp(0.0, 1.0);
        if !clean.motor_mix_range.is_finite() {
            clean.motor_mix_range = 0.0;
            fault = true;
        }
        if fault {
            self.faults.record(RtFault::InputNotFinite);
        }
        clean
    }

    // ---- tick-boundary operations --------------------------------------

    /// Zero all per-axis integral accumulators. Idempotent.
    pub fn reset_integral(&mut self) {
        self.iterm = [0.0; XYZ_AXIS_COUNT];
        if let Some(ac) = self.absolute_control.as_mut() {
            ac.reset();
        }
    }

    /// Gate whether P/I/D/F are computed or forced to zero.
    pub fn set_stabilisation(&mut self, enabled: bool) {
        if self.stabilisation_enabled != enabled {
            debug!(enabled, "stabilisation state changed");
        }
        self.stabilisation_enabled = enabled;
    }

    /// Hold the integral accumulator at zero while enabled (zero-throttle
    /// reset from the mixer layer).
    pub fn set_iterm_reset(&mut self, enabled: bool) {
        self.iterm_reset = enabled;
    }

    /// Externally override the anti-gravity accelerator gain (profile
    /// thousandths); clamped to the legal range.
    pub fn set_iterm_accelerator(&mut self, gain: u16) {
        self.anti_gravity.set_accelerator_gain(gain);
    }

    // ---- anti-gravity telemetry ----------------------------------------

    /// Whether the anti-gravity boost is currently substantial.
    pub fn anti_gravity_active(&self) -> bool {
        self.anti_gravity.is_active()
    }

    /// Configured anti-gravity mode.
    pub fn anti_gravity_mode(&self) -> AntiGravityMode {
        self.anti_gravity.mode()
    }

    /// Externally enable/disable the anti-gravity stage.
    pub fn set_anti_gravity(&mut self, enabled: bool) {
        self.anti_gravity.set_enabled(enabled);
    }

    // ---- launch control lifecycle --------------------------------------

    /// Arm the launch-control hold.
    pub fn init_launch_control(&mut self) {
        self.launch_control.init();
    }

    /// Activate or release the launch-control hold.
    pub fn set_launch_control_active(&mut self, active: bool) {
        self.launch_control.set_active(active);
    }

    /// Whether launch control currently holds the craft.
    pub fn launch_control_active(&self) -> bool {
        self.launch_control.is_active()
    }

    // ---- crash telemetry ------------------------------------------------

    /// Whether a crash has been confirmed since the last reset.
    pub fn crash_detected(&self) -> bool {
        self.crash.detected()
    }

    /// Whether crash recovery wants the craft disarmed.
    pub fn crash_disarm_requested(&self) -> bool {
        self.crash.disarm_requested()
    }

    // ---- throttle/motor path helpers -----------------------------------

    /// Boost an individual motor output along the inverse thrust curve.
    /// Pass-through when thrust linearization is off.
    pub fn apply_thrust_linearization(&self, motor_output: f32) -> f32 {
        match &self.thrust_linearization {
            Some(tl) => tl.apply(motor_output),
            None => motor_output,
        }
    }

    /// Compensate the collective throttle for the thrust-linearization
    /// boost. Pass-through when off.
    pub fn compensate_thrust_linearization(&self, throttle: f32) -> f32 {
        match &self.thrust_linearization {
            Some(tl) => tl.compensate(throttle),
            None => throttle,
        }
    }

    /// Scale a motor output against measured battery sag (0 = nominal,
    /// 1 = full configured sag). Pass-through when off.
    pub fn compensate_vbat_sag(&self, motor_output: f32, sag_ratio: f32) -> f32 {
        match &self.thrust_linearization {
            Some(tl) => tl.compensate_sag(motor_output, sag_ratio),
            None => motor_output,
        }
    }

    /// Transient throttle boost for the mixer's throttle path.
    /// Pass-through when off.
    pub fn apply_throttle_boost(&mut self, throttle: f32) -> f32 {
        match self.throttle_boost.as_mut() {
            Some(boost) => boost.apply(throttle),
            None => throttle,
        }
    }

    /// Recompute the throttle-adaptive D-term low-pass cutoffs for this
    /// tick.
    pub fn update_dyn_lpf(&mut self, throttle: f32) {
        let Some(config) = self.dyn_lpf else {
            return;
        };
        let cutoff = dyn_lpf_cutoff_hz(throttle, config.min_hz, config.max_hz, config.expo);
        for filter in &mut self.dterm_lowpass {
            filter.set_cutoff(cutoff, self.pid_frequency);
        }
    }

    /// Retune the dynamic D-term notch bank from externally estimated
    /// noise center frequencies (one per axis), clamped to the configured
    /// band. No-op when the dynamic notch is off.
    pub fn update_dyn_notch(&mut self, center_hz: [f32; XYZ_AXIS_COUNT]) {
        let pid_frequency = self.pid_frequency;
        let Some(bank) = self.dyn_notch.as_mut() else {
            return;
        };
        for (i, center) in center_hz.iter().enumerate() {
            if !center.is_finite() || *center <= 0.0 {
                continue;
            }
            let center = center.clamp(bank.min_hz, bank.max_hz);
            let cutoff = bank.cutoff_for(center);
            bank.filters[i].configure_notch(center, cutoff, pid_frequency);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PidInitError;
    use openflight_profile::{PidConfig, PidProfile};

    fn armed_input() -> TickInput {
        TickInput {
            armed: true,
            throttle: 0.3,
            ..TickInput::default()
        }
    }

    fn runtime() -> Result<PidRuntime, PidInitError> {
        let mut rt = PidRuntime::new(&PidProfile::default(), &PidConfig::default(), 8000.0)?;
        rt.set_stabilisation(true);
        Ok(rt)
    }

    #[test]
    fn test_stabilisation_off_zeroes_everything() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        rt.set_stabilisation(false);
        let input = TickInput {
            setpoint: [300.0, -200.0, 100.0],
            gyro: [50.0, 60.0, -70.0],
            ..armed_input()
        };
        let out = rt.run_control_loop(&input);
        for data in out {
            assert!(data.p.abs() < 1e-9);
            assert!(data.i.abs() < 1e-9);
            assert!(data.d.abs() < 1e-9);
            assert!(data.f.abs() < 1e-9);
            assert!(data.sum.abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_sum_bounded_for_extreme_inputs() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        let input = TickInput {
            setpoint: [10000.0, -10000.0, 10000.0],
            gyro: [-10000.0, 10000.0, -10000.0],
            ..armed_input()
        };
        for _ in 0..100 {
            let out = rt.run_control_loop(&input);
            assert!(out[0].sum.abs() <= 500.0);
            assert!(out[1].sum.abs() <= 500.0);
            assert!(out[2].sum.abs() <= 400.0);
        }
        Ok(())
    }

    #[test]
    fn test_raw_sum_exposed_unclamped() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        let input = TickInput {
            setpoint: [10000.0, 0.0, 0.0],
            ..armed_input()
        };
        for _ in 0..50 {
            rt.run_control_loop(&input);
        }
        let out = rt.axis_data();
        assert!(out[0].sum_raw > out[0].sum);
        Ok(())
    }

    #[test]
    fn test_reset_integral_idempotent() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        let input = TickInput {
            setpoint: [100.0, 100.0, 100.0],
            ..armed_input()
        };
        for _ in 0..100 {
            rt.run_control_loop(&input);
        }
        rt.reset_integral();
        rt.reset_integral();
        // Tick with zero error: I stays zero
        let out = rt.run_control_loop(&armed_input());
        for data in out {
            assert!(data.i.abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_p_term_steady_state() -> Result<(), PidInitError> {
        // Scenario from the tuning contract: constant setpoint 200 deg/s,
        // gyro 0, P gain 30 at PTERM_SCALE, loop at 8kHz
        let mut profile = PidProfile::default();
        profile.pid[0].p = 30;
        profile.emu_boost_pr = 0; // isolate the raw P path
        profile.rate_accel_limit = 0;
        let mut config = PidConfig::default();
        config.pid_process_denom = 1;
        let mut rt = PidRuntime::new(&profile, &config, 8000.0)?;
        rt.set_stabilisation(true);

        let input = TickInput {
            setpoint: [200.0, 0.0, 0.0],
            ..armed_input()
        };
        let mut p = 0.0;
        for _ in 0..100 {
            p = rt.run_control_loop(&input)[0].p;
        }
        let expected = 0.032029 * 30.0 * 200.0;
        assert!((p - expected).abs() < expected * 1e-3, "p = {p}, expected {expected}");
        Ok(())
    }

    #[test]
    fn test_iterm_accumulates_and_clamps() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        let input = TickInput {
            setpoint: [500.0, 0.0, 0.0],
            ..armed_input()
        };
        // The iterm-relax low-pass must settle before accumulation opens up
        let mut last_i = 0.0;
        for _ in 0..1000 {
            let i = rt.run_control_loop(&input)[0].i;
            assert!(i >= last_i);
            last_i = i;
        }
        assert!(last_i > 0.0);
        for _ in 0..100000 {
            rt.run_control_loop(&input);
        }
        assert!(rt.axis_data()[0].i <= 400.0 + 1e-3);
        Ok(())
    }

    #[test]
    fn test_iterm_reset_gate_holds_integral_at_zero() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        rt.set_iterm_reset(true);
        let input = TickInput {
            setpoint: [500.0, 0.0, 0.0],
            ..armed_input()
        };
        for _ in 0..100 {
            rt.run_control_loop(&input);
        }
        assert!(rt.axis_data()[0].i.abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_zero_throttle_suppression() -> Result<(), PidInitError> {
        let mut profile = PidProfile::default();
        profile.pid_at_min_throttle = false;
        let mut rt = PidRuntime::new(&profile, &PidConfig::default(), 8000.0)?;
        rt.set_stabilisation(true);
        let input = TickInput {
            setpoint: [300.0, 0.0, 0.0],
            zero_throttle: true,
            airmode_active: false,
            ..armed_input()
        };
        let out = rt.run_control_loop(&input);
        assert!(out[0].sum.abs() < 1e-9);

        // Airmode keeps the loop alive
        let input = TickInput {
            airmode_active: true,
            ..input
        };
        let out = rt.run_control_loop(&input);
        assert!(out[0].sum.abs() > 0.0);
        Ok(())
    }

    #[test]
    fn test_non_finite_input_sanitized() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        let input = TickInput {
            setpoint: [f32::NAN, 0.0, 0.0],
            gyro: [f32::INFINITY, 0.0, 0.0],
            ..armed_input()
        };
        let out = rt.run_control_loop(&input);
        assert!(out[0].sum.is_finite());
        assert!(rt.faults().input_not_finite > 0);
        Ok(())
    }

    #[test]
    fn test_acceleration_limit_slews_setpoint() -> Result<(), PidInitError> {
        let mut profile = PidProfile::default();
        profile.rate_accel_limit = 10; // 10 deg/s/ms
        let mut rt = PidRuntime::new(&profile, &PidConfig::default(), 8000.0)?;
        rt.set_stabilisation(true);
        let input = TickInput {
            setpoint: [1000.0, 0.0, 0.0],
            ..armed_input()
        };
        rt.run_control_loop(&input);
        // One tick can only move the setpoint by max_velocity, far below
        // the commanded 1000 deg/s
        assert!(rt.previous_setpoint(Axis::Roll) < 500.0);
        Ok(())
    }

    #[test]
    fn test_launch_control_holds_and_substitutes_gain() -> Result<(), PidInitError> {
        let mut profile = PidProfile::default();
        profile.launch_control_angle_limit = 10;
        let mut rt = PidRuntime::new(&profile, &PidConfig::default(), 8000.0)?;
        rt.set_stabilisation(true);
        rt.init_launch_control();
        assert!(rt.launch_control_active());

        // Pilot commands a flip; hold ignores it
        let input = TickInput {
            setpoint: [800.0, 0.0, 200.0],
            ..armed_input()
        };
        rt.run_control_loop(&input);
        assert!(rt.previous_setpoint(Axis::Roll).abs() < 1e-6);
        assert!(rt.previous_setpoint(Axis::Yaw).abs() < 1e-6);

        // Tipped past the angle limit: corrective setpoint appears
        let input = TickInput {
            attitude: [20.0, 0.0, 0.0],
            ..armed_input()
        };
        rt.run_control_loop(&input);
        assert!(rt.previous_setpoint(Axis::Roll) < 0.0);

        rt.set_launch_control_active(false);
        assert!(!rt.launch_control_active());
        Ok(())
    }

    #[test]
    fn test_update_dyn_lpf_tracks_throttle() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        // Exercise both ends of the curve; the filters must keep working
        rt.update_dyn_lpf(0.0);
        let input = armed_input();
        rt.run_control_loop(&input);
        rt.update_dyn_lpf(1.0);
        let out = rt.run_control_loop(&input);
        assert!(out[0].d.is_finite());
        Ok(())
    }

    #[test]
    fn test_update_dyn_notch_retunes_bank() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        // Centers clamp to the configured band; zero/non-finite are ignored
        rt.update_dyn_notch([300.0, 5000.0, 0.0]);
        let out = rt.run_control_loop(&armed_input());
        for data in out {
            assert!(data.d.is_finite());
        }
        Ok(())
    }

    #[test]
    fn test_thrust_linearization_passthrough_when_off() -> Result<(), PidInitError> {
        let rt = runtime()?;
        assert!((rt.apply_thrust_linearization(0.4) - 0.4).abs() < 1e-9);
        assert!((rt.compensate_thrust_linearization(0.4) - 0.4).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_crash_detection_scenario() -> Result<(), PidInitError> {
        let mut profile = PidProfile::default();
        profile.crash_recovery = openflight_profile::CrashRecovery::Disarm;
        profile.dterm_lowpass_hz = 0; // keep the D excursion unfiltered
        profile.dterm_lowpass2_hz = 0;
        profile.dyn_lpf_dterm_min_hz = 0;
        let mut rt = PidRuntime::new(&profile, &PidConfig::default(), 8000.0)?;
        rt.set_stabilisation(true);

        // Violent gyro oscillation, sticks quiet: a crash
        let ticks = rt.crash.confirm_ticks() + 10;
        for i in 0..ticks {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let input = TickInput {
                gyro: [sign * 800.0, 0.0, 0.0],
                ..armed_input()
            };
            rt.run_control_loop(&input);
        }
        assert!(rt.crash_detected());
        assert!(rt.crash_disarm_requested());
        Ok(())
    }

    #[test]
    fn test_crash_not_detected_during_flip() -> Result<(), PidInitError> {
        let mut profile = PidProfile::default();
        profile.crash_recovery = openflight_profile::CrashRecovery::Disarm;
        profile.dterm_lowpass_hz = 0;
        profile.dterm_lowpass2_hz = 0;
        profile.dyn_lpf_dterm_min_hz = 0;
        profile.rate_accel_limit = 0;
        let mut rt = PidRuntime::new(&profile, &PidConfig::default(), 8000.0)?;
        rt.set_stabilisation(true);

        // Same gyro violence, but the pilot is commanding a fast roll
        let ticks = rt.crash.confirm_ticks() + 10;
        for i in 0..ticks {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let input = TickInput {
                gyro: [sign * 800.0, 0.0, 0.0],
                setpoint: [700.0, 0.0, 0.0],
                rc_deflection: [1.0, 0.0, 0.0],
                ..armed_input()
            };
            rt.run_control_loop(&input);
        }
        assert!(!rt.crash_detected());
        Ok(())
    }
}
