//! Runtime State Container
//!
//! [`PidRuntime`] owns every filter instance, coefficient and stage state
//! the control loop needs, for the lifetime of the process. It is created
//! once from a profile, reset (not reallocated) on disarm/rearm, and
//! mutated only inside a tick. There is no ambient global: callers own the
//! runtime and pass it by reference, so profile swaps and resets are
//! naturally atomic with respect to tick boundaries - the exclusive borrow
//! is the lock.

use openflight_filters::{
    BiquadState, DynLpf2Config, DynLpf2State, LowpassFilter, LowpassKind, Pt1State,
};
use openflight_profile::{
    validate_profile, validation::validate_config, DtermFilterKind, DynNotchLocation, PidConfig,
    PidProfile, XYZ_AXIS_COUNT,
};
use tracing::info;

use crate::axis::{Axis, PidAxisData};
use crate::coefficients::{derive_coefficients, windup_point_inverse, PidCoefficient};
use crate::error::{PidInitError, RtFaultCounters};
use crate::idle::IdleGovernor;
use crate::stages::{
    AbsoluteControlConfig, AbsoluteControlState, AntiGravityState, BoostGains, CrashDetector,
    DMinState, FeedforwardState, ItermRelaxState, LaunchControlState, LevelState,
    ThrottleBoostState, ThrustLinearization,
};

/// Throttle-adaptive cutoff configuration for the D-term low-pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DynLpfConfig {
    pub min_hz: u16,
    pub max_hz: u16,
    pub expo: u8,
}

/// Dynamic D-term notch bank driven by external center-frequency estimates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DynNotchBank {
    pub filters: [BiquadState; XYZ_AXIS_COUNT],
    pub q: f32,
    pub min_hz: f32,
    pub max_hz: f32,
    pub location: DynNotchLocation,
}

impl DynNotchBank {
    /// Cutoff frequency equivalent to the configured Q at a center
    /// frequency: solving `Q = c*f / (c^2 - f^2)` for `f`.
    pub fn cutoff_for(&self, center_hz: f32) -> f32 {
        let inv_q = 1.0 / self.q;
        let ratio = ((inv_q * inv_q + 4.0).sqrt() - inv_q) * 0.5;
        center_hz * ratio
    }
}

/// The control loop's entire mutable state.
///
/// Field groups mirror the data flow: derived coefficients, per-axis filter
/// instances, the integral accumulator and history, then one state slot per
/// optional compensation stage.
#[derive(Debug, Clone)]
pub struct PidRuntime {
    // Loop timing
    pub(crate) dt: f32,
    pub(crate) pid_frequency: f32,

    // Gates
    pub(crate) stabilisation_enabled: bool,
    pub(crate) pid_at_min_throttle: bool,
    pub(crate) iterm_reset: bool,

    // Derived coefficients and limits
    pub(crate) coefficient: [PidCoefficient; XYZ_AXIS_COUNT],
    pub(crate) sum_limit: f32,
    pub(crate) sum_limit_yaw: f32,
    pub(crate) iterm_limit: f32,
    pub(crate) windup_point_inv: f32,
    pub(crate) max_velocity: [f32; XYZ_AXIS_COUNT],
    pub(crate) i_decay: f32,
    pub(crate) i_decay_cutoff: f32,
    pub(crate) dterm_measurement_slider: f32,

    // Integral accumulator and history
    pub(crate) iterm: [f32; XYZ_AXIS_COUNT],
    pub(crate) iterm_rotation_enabled: bool,
    pub(crate) previous_setpoint: [f32; XYZ_AXIS_COUNT],
    pub(crate) previous_gyro_dterm: [f32; XYZ_AXIS_COUNT],
    pub(crate) previous_error: [f32; XYZ_AXIS_COUNT],

    // D-term filter chain
    pub(crate) dterm_notch: Option<[BiquadState; XYZ_AXIS_COUNT]>,
    pub(crate) dterm_lowpass: [LowpassFilter; XYZ_AXIS_COUNT],
    pub(crate) dterm_lowpass2: [LowpassFilter; XYZ_AXIS_COUNT],
    pub(crate) dterm_dynlpf2: Option<[DynLpf2State; XYZ_AXIS_COUNT]>,
    pub(crate) dyn_notch: Option<DynNotchBank>,
    pub(crate) dyn_lpf: Option<DynLpfConfig>,
    pub(crate) pterm_yaw_lowpass: Option<Pt1State>,

    // Compensation stages
    pub(crate) level: LevelState,
    pub(crate) iterm_relax: Option<ItermRelaxState>,
    pub(crate) absolute_control: Option<AbsoluteControlState>,
    pub(crate) anti_gravity: AntiGravityState,
    pub(crate) d_min: Option<DMinState>,
    pub(crate) boost: BoostGains,
    pub(crate) feedforward: FeedforwardState,
    pub(crate) crash: CrashDetector,
    pub(crate) launch_control: LaunchControlState,
    pub(crate) thrust_linearization: Option<ThrustLinearization>,
    pub(crate) throttle_boost: Option<ThrottleBoostState>,
    pub(crate) idle_governor: Option<IdleGovernor>,

    // Outputs
    pub(crate) axis_data: [PidAxisData; XYZ_AXIS_COUNT],
    pub(crate) faults: RtFaultCounters,
}

impl PidRuntime {
    /// Derive a runtime from a validated profile and loop configuration.
    ///
    /// `gyro_rate_hz` is the gyro sampling rate; the loop runs at
    /// `gyro_rate_hz / pid_process_denom`. Derivation is idempotent: the
    /// same inputs produce bit-identical coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`PidInitError`] if the loop rate is unusable or the profile
    /// fails validation.
    pub fn new(
        profile: &PidProfile,
        config: &PidConfig,
        gyro_rate_hz: f32,
    ) -> Result<Self, PidInitError> {
        Self::with_absolute_control(profile, config, gyro_rate_hz, AbsoluteControlConfig::default())
    }

    /// Like [`PidRuntime::new`] with explicit absolute-control tuning (the
    /// persisted profile carries no fields for that stage).
    ///
    /// # Errors
    ///
    /// Returns [`PidInitError`] if the loop rate is unusable or the profile
    /// fails validation.
    pub fn with_absolute_control(
        profile: &PidProfile,
        config: &PidConfig,
        gyro_rate_hz: f32,
        ac_config: AbsoluteControlConfig,
    ) -> Result<Self, PidInitError> {
        validate_profile(profile)?;
        validate_config(config)?;
        if !gyro_rate_hz.is_finite() || gyro_rate_hz <= 0.0 {
            return Err(PidInitError::InvalidLoopRate {
                gyro_rate_hz,
                denom: config.pid_process_denom,
            });
        }

        let pid_frequency = gyro_rate_hz / f32::from(config.pid_process_denom);
        let dt = 1.0 / pid_frequency;

        let dterm_notch = (profile.dterm_notch_hz > 0
            && profile.dterm_notch_cutoff < profile.dterm_notch_hz)
            .then(|| {
                [BiquadState::notch(
                    f32::from(profile.dterm_notch_hz),
                    f32::from(profile.dterm_notch_cutoff),
                    pid_frequency,
                ); XYZ_AXIS_COUNT]
            });

        let lowpass = |kind: DtermFilterKind, hz: u16| {
            let kind = match kind {
                DtermFilterKind::Pt1 => LowpassKind::Pt1,
                DtermFilterKind::Biquad => LowpassKind::Biquad,
            };
            LowpassFilter::new(kind, f32::from(hz), pid_frequency)
        };

        let dterm_dynlpf2 = profile.dterm_dynlpf2_enable.then(|| {
            let dynlpf2_config = DynLpf2Config {
                fmin_hz: f32::from(profile.dterm_dynlpf2_fmin),
                fmax_hz: f32::from(profile.dterm_dynlpf2_fmax),
                gain: f32::from(profile.dterm_dynlpf2_gain),
                fc_fc_hz: f32::from(profile.dterm_dynlpf2_fc_fc),
                center_threshold: f32::from(profile.dterm_dynlpf2_center_threshold),
                throttle_threshold: f32::from(profile.dterm_dynlpf2_throttle_threshold) / 1000.0,
                throttle_gain: f32::from(profile.dterm_dynlpf2_throttle_gain),
                two_stage: profile.dterm_dynlpf2_two_stage,
            };
            [DynLpf2State::new(dynlpf2_config, dt); XYZ_AXIS_COUNT]
        });

        let dyn_notch = (profile.dterm_dyn_notch_q > 0).then(|| DynNotchBank {
            filters: [BiquadState::bypass(); XYZ_AXIS_COUNT],
            q: f32::from(profile.dterm_dyn_notch_q) / 100.0,
            min_hz: f32::from(profile.dterm_dyn_notch_min_hz),
            max_hz: f32::from(profile.dterm_dyn_notch_max_hz),
            location: profile.dterm_dyn_notch_location,
        });

        let dyn_lpf = (profile.dyn_lpf_dterm_min_hz > 0).then(|| DynLpfConfig {
            min_hz: profile.dyn_lpf_dterm_min_hz,
            max_hz: profile.dyn_lpf_dterm_max_hz,
            expo: profile.dyn_lpf_curve_expo,
        });

        let accel_limit = f32::from(profile.rate_accel_limit) * 100.0 * dt;
        let accel_limit_yaw = f32::from(profile.yaw_rate_accel_limit) * 100.0 * dt;

        let runtime = Self {
            dt,
            pid_frequency,
            stabilisation_enabled: false,
            pid_at_min_throttle: profile.pid_at_min_throttle,
            iterm_reset: false,

            coefficient: derive_coefficients(profile),
            sum_limit: f32::from(profile.pid_sum_limit),
            sum_limit_yaw: f32::from(profile.pid_sum_limit_yaw),
            iterm_limit: f32::from(profile.iterm_limit),
            windup_point_inv: windup_point_inverse(profile.iterm_windup_point_percent),
            max_velocity: [accel_limit, accel_limit, accel_limit_yaw],
            i_decay: f32::from(profile.i_decay),
            i_decay_cutoff: f32::from(profile.i_decay_cutoff),
            dterm_measurement_slider: f32::from(profile.dterm_measurement_slider) / 100.0,

            iterm: [0.0; XYZ_AXIS_COUNT],
            iterm_rotation_enabled: profile.iterm_rotation,
            previous_setpoint: [0.0; XYZ_AXIS_COUNT],
            previous_gyro_dterm: [0.0; XYZ_AXIS_COUNT],
            previous_error: [0.0; XYZ_AXIS_COUNT],

            dterm_notch,
            dterm_lowpass: [lowpass(profile.dterm_filter_type, profile.dterm_lowpass_hz);
                XYZ_AXIS_COUNT],
            dterm_lowpass2: [lowpass(profile.dterm_filter2_type, profile.dterm_lowpass2_hz);
                XYZ_AXIS_COUNT],
            dterm_dynlpf2,
            dyn_notch,
            dyn_lpf,
            pterm_yaw_lowpass: (profile.yaw_lowpass_hz > 0)
                .then(|| Pt1State::new(f32::from(profile.yaw_lowpass_hz), dt)),

            level: LevelState::from_profile(profile, dt),
            iterm_relax: (profile.iterm_relax != openflight_profile::ItermRelax::Off).then(|| {
                ItermRelaxState::new(
                    profile.iterm_relax,
                    profile.iterm_relax_type,
                    profile.iterm_relax_cutoff,
                    dt,
                )
            }),
            absolute_control: AbsoluteControlState::new(&ac_config, dt),
            anti_gravity: AntiGravityState::new(
                profile.anti_gravity_mode,
                profile.iterm_accelerator_gain,
                profile.iterm_throttle_threshold,
                dt,
            ),
            d_min: DMinState::new(profile, pid_frequency, dt),
            boost: BoostGains::from_profile(profile),
            feedforward: FeedforwardState::from_profile(profile, dt),
            crash: CrashDetector::from_profile(profile, pid_frequency),
            launch_control: LaunchControlState::from_profile(profile),
            thrust_linearization: ThrustLinearization::new(profile),
            throttle_boost: ThrottleBoostState::new(profile, dt),
            idle_governor: IdleGovernor::new(profile),

            axis_data: [PidAxisData::default(); XYZ_AXIS_COUNT],
            faults: RtFaultCounters::default(),
        };

        info!(
            profile = %profile.profile_name,
            pid_frequency,
            "pid runtime derived"
        );
        Ok(runtime)
    }

    /// Swap in a new profile between ticks. Equivalent to a fresh
    /// derivation followed by [`PidRuntime::reset`]; the exclusive borrow
    /// guarantees no tick observes partially updated coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`PidInitError`] if the new profile or loop rate is invalid;
    /// the existing runtime is left untouched in that case.
    pub fn apply_profile(
        &mut self,
        profile: &PidProfile,
        config: &PidConfig,
        gyro_rate_hz: f32,
    ) -> Result<(), PidInitError> {
        let stabilisation = self.stabilisation_enabled;
        let mut fresh = Self::new(profile, config, gyro_rate_hz)?;
        fresh.stabilisation_enabled = stabilisation;
        *self = fresh;
        Ok(())
    }

    /// Reset all accumulated state without touching derived coefficients.
    /// Called on disarm/rearm.
    pub fn reset(&mut self) {
        self.iterm = [0.0; XYZ_AXIS_COUNT];
        self.previous_setpoint = [0.0; XYZ_AXIS_COUNT];
        self.previous_gyro_dterm = [0.0; XYZ_AXIS_COUNT];
        self.previous_error = [0.0; XYZ_AXIS_COUNT];
        self.iterm_reset = false;

        if let Some(notch) = self.dterm_notch.as_mut() {
            for f in notch.iter_mut() {
                reset_biquad(f);
            }
        }
        for f in &mut self.dterm_lowpass {
            reset_lowpass(f);
        }
        for f in &mut self.dterm_lowpass2 {
            reset_lowpass(f);
        }
        if let Some(dynlpf2) = self.dterm_dynlpf2.as_mut() {
            for f in dynlpf2.iter_mut() {
                f.reset();
            }
        }
        if let Some(bank) = self.dyn_notch.as_mut() {
            for f in bank.filters.iter_mut() {
                reset_biquad(f);
            }
        }
        if let Some(lpf) = self.pterm_yaw_lowpass.as_mut() {
            lpf.state = 0.0;
        }

        self.level.reset();
        if let Some(relax) = self.iterm_relax.as_mut() {
            relax.reset();
        }
        if let Some(ac) = self.absolute_control.as_mut() {
            ac.reset();
        }
        self.anti_gravity.reset();
        if let Some(d_min) = self.d_min.as_mut() {
            d_min.reset();
        }
        self.feedforward.reset();
        self.crash.reset();
        if let Some(boost) = self.throttle_boost.as_mut() {
            boost.reset();
        }
        if let Some(governor) = self.idle_governor.as_mut() {
            governor.reset();
        }

        for data in &mut self.axis_data {
            data.zero();
        }
    }

    // ---- read-only accessors -------------------------------------------

    /// Loop period in seconds.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Loop frequency in Hz.
    pub fn pid_frequency(&self) -> f32 {
        self.pid_frequency
    }

    /// The effective setpoint the previous tick settled on for an axis.
    pub fn previous_setpoint(&self, axis: Axis) -> f32 {
        self.previous_setpoint[axis.index()]
    }

    /// Feedforward boost factor (telemetry).
    pub fn ff_boost_factor(&self) -> f32 {
        self.feedforward.boost_factor()
    }

    /// Feedforward smoothing factor (telemetry).
    pub fn ff_smooth_factor(&self) -> f32 {
        self.feedforward.smooth_factor()
    }

    /// The most recent tick's outputs.
    pub fn axis_data(&self) -> &[PidAxisData; XYZ_AXIS_COUNT] {
        &self.axis_data
    }

    /// Hot-path fault counters.
    pub fn faults(&self) -> RtFaultCounters {
        self.faults
    }

    /// Current anti-gravity accelerator gain in profile thousandths.
    pub fn iterm_accelerator_gain(&self) -> u16 {
        self.anti_gravity.accelerator_gain()
    }

    /// Whether stabilisation is currently on.
    pub fn stabilisation_enabled(&self) -> bool {
        self.stabilisation_enabled
    }

    /// The idle governor, when the profile enables one.
    pub fn idle_governor_mut(&mut self) -> Option<&mut IdleGovernor> {
        self.idle_governor.as_mut()
    }
}

pub(crate) fn reset_biquad(state: &mut BiquadState) {
    state.x1 = 0.0;
    state.x2 = 0.0;
    state.y1 = 0.0;
    state.y2 = 0.0;
}

pub(crate) fn reset_lowpass(filter: &mut LowpassFilter) {
    use openflight_filters::FilterState;
    filter.reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Result<PidRuntime, PidInitError> {
        PidRuntime::new(&PidProfile::default(), &PidConfig::default(), 8000.0)
    }

    #[test]
    fn test_loop_rate_derivation() -> Result<(), PidInitError> {
        let rt = runtime()?;
        // 8kHz gyro, denom 2 -> 4kHz loop
        assert!((rt.pid_frequency() - 4000.0).abs() < 1e-3);
        assert!((rt.dt() - 0.00025).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_invalid_gyro_rate_rejected() {
        let profile = PidProfile::default();
        let config = PidConfig::default();
        assert!(PidRuntime::new(&profile, &config, 0.0).is_err());
        assert!(PidRuntime::new(&profile, &config, f32::NAN).is_err());
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let mut profile = PidProfile::default();
        profile.pid_sum_limit = 5;
        assert!(PidRuntime::new(&profile, &PidConfig::default(), 8000.0).is_err());
    }

    #[test]
    fn test_derivation_idempotent() -> Result<(), PidInitError> {
        let a = runtime()?;
        let b = runtime()?;
        assert_eq!(a.coefficient, b.coefficient);
        assert!((a.sum_limit - b.sum_limit).abs() < 1e-9);
        assert!((a.windup_point_inv - b.windup_point_inv).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_optional_stages_follow_profile() -> Result<(), PidInitError> {
        let rt = runtime()?;
        // Defaults: relax on, d_min on, no notch, no dynlpf2, no launch yet
        assert!(rt.iterm_relax.is_some());
        assert!(rt.d_min.is_some());
        assert!(rt.dterm_notch.is_none());
        assert!(rt.dterm_dynlpf2.is_none());
        assert!(rt.absolute_control.is_none());
        assert!(rt.thrust_linearization.is_none());
        assert!(rt.idle_governor.is_none());

        let mut profile = PidProfile::default();
        profile.dterm_notch_hz = 260;
        profile.dterm_dynlpf2_enable = true;
        profile.thrust_linearization = 40;
        profile.idle_min_rpm = 10;
        let rt = PidRuntime::new(&profile, &PidConfig::default(), 8000.0)?;
        assert!(rt.dterm_notch.is_some());
        assert!(rt.dterm_dynlpf2.is_some());
        assert!(rt.thrust_linearization.is_some());
        assert!(rt.idle_governor.is_some());
        Ok(())
    }

    #[test]
    fn test_reset_preserves_coefficients() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        let coefficients = rt.coefficient;
        rt.iterm = [50.0, -30.0, 10.0];
        rt.reset();
        for i in 0..3 {
            assert!(rt.iterm[i].abs() < 1e-9);
        }
        assert_eq!(rt.coefficient, coefficients);
        Ok(())
    }

    #[test]
    fn test_apply_profile_keeps_stabilisation_gate() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        rt.stabilisation_enabled = true;
        rt.apply_profile(&PidProfile::named("race"), &PidConfig::default(), 8000.0)?;
        assert!(rt.stabilisation_enabled());
        Ok(())
    }

    #[test]
    fn test_apply_profile_invalid_leaves_runtime_untouched() -> Result<(), PidInitError> {
        let mut rt = runtime()?;
        rt.iterm = [5.0, 5.0, 5.0];
        let mut bad = PidProfile::default();
        bad.pid_sum_limit = 1;
        assert!(rt
            .apply_profile(&bad, &PidConfig::default(), 8000.0)
            .is_err());
        for i in 0..3 {
            assert!((rt.iterm[i] - 5.0).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_dyn_notch_cutoff_solver() {
        let bank = DynNotchBank {
            filters: [BiquadState::bypass(); 3],
            q: 4.0,
            min_hz: 150.0,
            max_hz: 600.0,
            location: DynNotchLocation::PreFilter,
        };
        let cutoff = bank.cutoff_for(300.0);
        assert!(cutoff > 0.0 && cutoff < 300.0);
        // Round trip through the notch Q relation
        let q = BiquadState::notch_q(300.0, cutoff);
        assert!(q.is_some(), "cutoff solver produced a degenerate notch");
        if let Some(q) = q {
            assert!((q - 4.0).abs() < 0.05);
        }
    }
}
