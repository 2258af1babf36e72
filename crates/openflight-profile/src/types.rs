//! Profile type definitions
//!
//! Field widths (u8/u16/i8) are the storage-compatibility contract with the
//! external parameter-group layer and existing tuning tools; do not widen
//! them without bumping the schema version.

use serde::{Deserialize, Serialize};

/// Number of controlled rotation axes (roll, pitch, yaw).
pub const XYZ_AXIS_COUNT: usize = 3;

/// Maximum length of a profile name, in bytes.
pub const MAX_PROFILE_NAME_LENGTH: usize = 8;

/// Maximum PID process denominator relative to the gyro sample rate.
pub const MAX_PID_PROCESS_DENOM: u8 = 16;

/// Per-axis PID-F gain bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pidf {
    /// Proportional gain.
    pub p: u8,
    /// Integral gain.
    pub i: u8,
    /// Derivative gain.
    pub d: u8,
    /// Feedforward gain.
    pub f: u16,
}

impl Pidf {
    /// Convenience constructor.
    pub const fn new(p: u8, i: u8, d: u8, f: u16) -> Self {
        Self { p, i, d, f }
    }
}

/// Anti-gravity ramping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AntiGravityMode {
    /// Gain ramps continuously with the high-passed throttle magnitude.
    #[default]
    Smooth,
    /// Gain switches to the full value the tick the threshold is crossed.
    Step,
}

/// Iterm-relax axis selection and accumulation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItermRelax {
    /// Disabled.
    Off,
    /// Roll and pitch, hard suppression.
    #[default]
    Rp,
    /// Roll, pitch and yaw, hard suppression.
    Rpy,
    /// Roll and pitch, but accumulation toward zero is never suppressed.
    RpInc,
    /// Roll, pitch and yaw, but accumulation toward zero is never suppressed.
    RpyInc,
}

impl ItermRelax {
    /// Whether the relax applies to the given axis index (yaw is 2).
    pub fn applies_to_yaw(self) -> bool {
        matches!(self, Self::Rpy | Self::RpyInc)
    }

    /// Whether accumulation that shrinks the integral bypasses suppression.
    pub fn is_incremental(self) -> bool {
        matches!(self, Self::RpInc | Self::RpyInc)
    }
}

/// What drives the iterm-relax suppression decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItermRelaxType {
    /// Suppression tracks how far the gyro deviates from the predicted
    /// response to the setpoint.
    Gyro,
    /// Suppression tracks the high-passed setpoint alone.
    #[default]
    Setpoint,
}

/// Feedforward interpolation variant over RC setpoint steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FfInterpolation {
    /// Plain per-tick setpoint derivative.
    Off,
    /// Interpolated setpoint deltas.
    #[default]
    On,
    /// Interpolated, averaged over the last 2 deltas.
    Avg2,
    /// Interpolated, averaged over the last 3 deltas.
    Avg3,
    /// Interpolated, averaged over the last 4 deltas.
    Avg4,
}

impl FfInterpolation {
    /// Averaging window length (1 = no averaging).
    pub fn window(self) -> usize {
        match self {
            Self::Off | Self::On => 1,
            Self::Avg2 => 2,
            Self::Avg3 => 3,
            Self::Avg4 => 4,
        }
    }
}

/// Response to a detected crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrashRecovery {
    /// Detect and report only.
    #[default]
    Off,
    /// Request disarm on sustained detection.
    Disarm,
}

/// Which axes launch control holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaunchControlMode {
    /// All axes, pitch correction in both directions.
    #[default]
    Normal,
    /// Pitch only (launch stand or top-mount), nose-up correction only.
    PitchOnly,
    /// All axes, full-authority corrections.
    Full,
}

/// D-term low-pass implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DtermFilterKind {
    /// Single-pole low-pass.
    #[default]
    Pt1,
    /// Biquad low-pass.
    Biquad,
}

/// Where the dynamic D-term notch sits in the D filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DynNotchLocation {
    /// Before the static notch and low-pass stages.
    #[default]
    PreFilter,
    /// After the low-pass stages.
    PostFilter,
}

/// Persisted tuning profile for the attitude-control loop.
///
/// One of several selectable banks; the storage layer owns persistence and
/// selection, the control core derives working coefficients from whichever
/// bank is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidProfile {
    /// Schema format version for migration tracking.
    /// Old profiles without this field deserialize as 0.
    #[serde(default)]
    pub schema_version: u32,
    /// Descriptive name, at most [`MAX_PROFILE_NAME_LENGTH`] bytes.
    pub profile_name: String,

    /// Gain banks: roll, pitch, yaw.
    pub pid: [Pidf; XYZ_AXIS_COUNT],
    /// Virtual gain bank for small attitude errors in level mode.
    pub pid_level_low: Pidf,
    /// Virtual gain bank for large attitude errors in level mode.
    pub pid_level_high: Pidf,

    // D-term filtering
    /// Additional yaw P-term filter for noisy yaw axes, Hz (0 = off).
    pub yaw_lowpass_hz: u16,
    /// First D-term low-pass cutoff, Hz (0 = off).
    pub dterm_lowpass_hz: u16,
    /// Second D-term low-pass cutoff, Hz (0 = off).
    pub dterm_lowpass2_hz: u16,
    /// First D-term low-pass implementation.
    pub dterm_filter_type: DtermFilterKind,
    /// Second D-term low-pass implementation.
    pub dterm_filter2_type: DtermFilterKind,
    /// Static D-term notch center, Hz (0 = off).
    pub dterm_notch_hz: u16,
    /// Static D-term notch lower cutoff, Hz.
    pub dterm_notch_cutoff: u16,

    // Windup and output limits
    /// Iterm windup threshold, percent of motor-mix saturation.
    pub iterm_windup_point_percent: u8,
    /// Absolute clamp on the per-axis integral term.
    pub iterm_limit: u16,
    /// Clamp on the per-axis P+I+D+F sum (roll/pitch).
    pub pid_sum_limit: u16,
    /// Clamp on the yaw sum.
    pub pid_sum_limit_yaw: u16,
    /// Keep PIDs active at zero throttle.
    pub pid_at_min_throttle: bool,

    // Angle / horizon mode
    /// Maximum lean angle in level mode, degrees.
    pub level_angle_limit: u8,
    /// Expo applied to the angle-mode stick curve.
    pub angle_expo: u8,
    /// Stick position where horizon leveling has fully faded, percent.
    pub horizon_transition: u8,
    /// Horizon leveling strength.
    pub horizon_gain: u8,
    /// Inclination factor for horizon mode tilt fade.
    pub racemode_tilt_effect: u8,
    /// Racemode horizon variant (roll-only leveling).
    pub racemode_horizon: bool,
    /// NFE race mode: pitch stays gyro-based in level mode.
    pub nfe_racemode: bool,

    // Anti-gravity
    /// Ramping behavior.
    pub anti_gravity_mode: AntiGravityMode,
    /// Throttle-change threshold arming the accelerator.
    pub iterm_throttle_threshold: u16,
    /// Accelerator gain in thousandths (1000 = 1.0x).
    pub iterm_accelerator_gain: u16,

    // Setpoint acceleration limits
    /// Roll/pitch setpoint acceleration limit, deg/s/ms (0 = off).
    pub rate_accel_limit: u16,
    /// Yaw setpoint acceleration limit, deg/s/ms (0 = off).
    pub yaw_rate_accel_limit: u16,

    // Crash detection
    /// D-term magnitude threshold, deg/s/s.
    pub crash_dthreshold: u16,
    /// Gyro magnitude threshold, deg/s.
    pub crash_gthreshold: u16,
    /// Setpoint magnitude must stay below this, deg/s.
    pub crash_setpoint_threshold: u16,
    /// Response on sustained detection.
    pub crash_recovery: CrashRecovery,

    // Feedforward
    /// Feedforward weight transition by stick deflection (0 = full always).
    pub feed_forward_transition: u8,
    /// High-pass boost added to feedforward, percent.
    pub ff_boost: u8,
    /// Feedforward source interpolation variant.
    pub ff_interpolate_sp: FfInterpolation,
    /// Maximum setpoint rate percentage feedforward may push toward.
    pub ff_max_rate_limit: u8,
    /// Smoothing for interpolated feedforward steps.
    pub ff_smooth_factor: u8,

    // Iterm behavior
    /// Rotate the integral vector with the measured rotation each tick.
    pub iterm_rotation: bool,
    /// Iterm-relax variant.
    pub iterm_relax: ItermRelax,
    /// Iterm-relax trigger source.
    pub iterm_relax_type: ItermRelaxType,
    /// Iterm-relax high-pass corner, Hz.
    pub iterm_relax_cutoff: u8,
    /// Iterm decay rate (0 = off).
    pub i_decay: u8,
    /// Gyro rate below which decay engages, deg/s.
    pub i_decay_cutoff: u8,

    // D-min
    /// Per-axis derivative gain floor (0 = D-min off for that axis).
    pub d_min: [u8; XYZ_AXIS_COUNT],
    /// Gyro activity gain for the D boost.
    pub d_min_gain: u8,
    /// Setpoint weighting for the D boost, percent.
    pub d_min_advance: u8,

    // Transient boosts
    /// Error boost gain, roll/pitch.
    pub emu_boost_pr: u16,
    /// Error boost gain, yaw.
    pub emu_boost_y: u16,
    /// Error boost clamp as a fraction of the raw error, roll/pitch, percent.
    pub emu_boost_limit_pr: u8,
    /// Error boost clamp, yaw, percent.
    pub emu_boost_limit_y: u8,
    /// D-term boost gain.
    pub dterm_boost: u16,
    /// D-term boost clamp, percent.
    pub dterm_boost_limit: u8,
    /// Blend between gyro measurement (100) and rate error (0) as the
    /// D-term source.
    pub dterm_measurement_slider: u8,

    // Throttle-adaptive D low-pass
    /// Cutoff at zero throttle, Hz (0 = feature off).
    pub dyn_lpf_dterm_min_hz: u16,
    /// Cutoff at full throttle, Hz.
    pub dyn_lpf_dterm_max_hz: u16,
    /// Curve expo, tenths.
    pub dyn_lpf_curve_expo: u8,

    // Dynamic D-term notch (center frequencies estimated externally)
    /// Notch Q in hundredths.
    pub dterm_dyn_notch_q: u16,
    /// Center frequency floor, Hz.
    pub dterm_dyn_notch_min_hz: u16,
    /// Center frequency ceiling, Hz.
    pub dterm_dyn_notch_max_hz: u16,
    /// Position of the dynamic notch in the D filter chain.
    pub dterm_dyn_notch_location: DynNotchLocation,

    // Dynamics-following two-stage low-pass
    /// Enable the dynamics-following low-pass in place of the second
    /// low-pass stage.
    pub dterm_dynlpf2_enable: bool,
    /// Run two cascaded stages instead of one.
    pub dterm_dynlpf2_two_stage: bool,
    /// Cutoff floor, Hz.
    pub dterm_dynlpf2_fmin: u16,
    /// Cutoff ceiling, Hz.
    pub dterm_dynlpf2_fmax: u16,
    /// Innovation gain.
    pub dterm_dynlpf2_gain: u16,
    /// Cutoff-smoother cutoff, Hz.
    pub dterm_dynlpf2_fc_fc: u16,
    /// Innovation floor below which the cutoff re-centers.
    pub dterm_dynlpf2_center_threshold: u16,
    /// Throttle (per-mille) where the throttle term starts.
    pub dterm_dynlpf2_throttle_threshold: u16,
    /// Hz of cutoff per unit throttle above the threshold.
    pub dterm_dynlpf2_throttle_gain: u16,

    // Launch control
    /// Axis scope while holding for launch.
    pub launch_control_mode: LaunchControlMode,
    /// Throttle percent that triggers the launch.
    pub launch_control_throttle_percent: u8,
    /// Attitude clamp while holding, degrees (0 = off).
    pub launch_control_angle_limit: u8,
    /// Iterm gain used while launch control is active.
    pub launch_control_gain: u8,
    /// Whether the trigger can be reset after firing.
    pub launch_control_allow_trigger_reset: bool,

    // Thrust / throttle shaping
    /// Thrust linearization factor, percent (0 = off).
    pub thrust_linearization: u8,
    /// Motor-output reduction at full battery sag, percent of the maximum
    /// compensation (0 = off).
    pub vbat_sag_compensation: u8,
    /// Transient throttle boost amount (100 adds 10x the high-passed
    /// throttle).
    pub throttle_boost: u8,
    /// Throttle boost high-pass cutoff, Hz.
    pub throttle_boost_cutoff: u8,
    /// Upper limit of motor output, percent.
    pub motor_output_limit: u8,

    // Idle governor
    /// Minimum motor speed, hundreds of RPM (0 = governor off).
    pub idle_min_rpm: u8,
    /// How quickly the integrating controller corrects.
    pub idle_adjustment_speed: u8,
    /// Proportional gain.
    pub idle_p: u8,
    /// Clamp on the proportional contribution.
    pub idle_pid_limit: u8,
    /// Clamp on the integrated correction.
    pub idle_max_increase: u8,

    /// Cell count for automatic profile switching (0 = any).
    pub auto_profile_cell_count: i8,
}

impl Default for PidProfile {
    fn default() -> Self {
        Self {
            schema_version: crate::CURRENT_SCHEMA_VERSION,
            profile_name: String::new(),

            pid: [
                Pidf::new(42, 85, 35, 90), // roll
                Pidf::new(46, 90, 38, 95), // pitch
                Pidf::new(45, 90, 0, 90),  // yaw
            ],
            pid_level_low: Pidf::new(55, 0, 24, 0),
            pid_level_high: Pidf::new(40, 0, 2, 0),

            yaw_lowpass_hz: 0,
            dterm_lowpass_hz: 150,
            dterm_lowpass2_hz: 150,
            dterm_filter_type: DtermFilterKind::Pt1,
            dterm_filter2_type: DtermFilterKind::Pt1,
            dterm_notch_hz: 0,
            dterm_notch_cutoff: 160,

            iterm_windup_point_percent: 100,
            iterm_limit: 400,
            pid_sum_limit: 500,
            pid_sum_limit_yaw: 400,
            pid_at_min_throttle: true,

            level_angle_limit: 55,
            angle_expo: 0,
            horizon_transition: 0,
            horizon_gain: 50,
            racemode_tilt_effect: 130,
            racemode_horizon: false,
            nfe_racemode: false,

            anti_gravity_mode: AntiGravityMode::Smooth,
            iterm_throttle_threshold: 250,
            iterm_accelerator_gain: 5000,

            rate_accel_limit: 0,
            yaw_rate_accel_limit: 0,

            crash_dthreshold: 50,
            crash_gthreshold: 400,
            crash_setpoint_threshold: 350,
            crash_recovery: CrashRecovery::Off,

            feed_forward_transition: 0,
            ff_boost: 15,
            ff_interpolate_sp: FfInterpolation::On,
            ff_max_rate_limit: 100,
            ff_smooth_factor: 37,

            iterm_rotation: false,
            iterm_relax: ItermRelax::Rp,
            iterm_relax_type: ItermRelaxType::Setpoint,
            iterm_relax_cutoff: 15,
            i_decay: 4,
            i_decay_cutoff: 200,

            d_min: [20, 22, 0],
            d_min_gain: 27,
            d_min_advance: 20,

            emu_boost_pr: 15,
            emu_boost_y: 40,
            emu_boost_limit_pr: 20,
            emu_boost_limit_y: 40,
            dterm_boost: 0,
            dterm_boost_limit: 20,
            dterm_measurement_slider: 100,

            dyn_lpf_dterm_min_hz: 70,
            dyn_lpf_dterm_max_hz: 170,
            dyn_lpf_curve_expo: 0,

            dterm_dyn_notch_q: 400,
            dterm_dyn_notch_min_hz: 150,
            dterm_dyn_notch_max_hz: 600,
            dterm_dyn_notch_location: DynNotchLocation::PreFilter,

            dterm_dynlpf2_enable: false,
            dterm_dynlpf2_two_stage: true,
            dterm_dynlpf2_fmin: 70,
            dterm_dynlpf2_fmax: 450,
            dterm_dynlpf2_gain: 40,
            dterm_dynlpf2_fc_fc: 15,
            dterm_dynlpf2_center_threshold: 10,
            dterm_dynlpf2_throttle_threshold: 300,
            dterm_dynlpf2_throttle_gain: 200,

            launch_control_mode: LaunchControlMode::Normal,
            launch_control_throttle_percent: 20,
            launch_control_angle_limit: 0,
            launch_control_gain: 40,
            launch_control_allow_trigger_reset: true,

            thrust_linearization: 0,
            vbat_sag_compensation: 0,
            throttle_boost: 5,
            throttle_boost_cutoff: 15,
            motor_output_limit: 100,

            idle_min_rpm: 0,
            idle_adjustment_speed: 50,
            idle_p: 50,
            idle_pid_limit: 200,
            idle_max_increase: 150,

            auto_profile_cell_count: 0,
        }
    }
}

impl PidProfile {
    /// Create a named profile with default tuning.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            profile_name: name.into(),
            ..Self::default()
        }
    }
}

/// Loop-rate configuration, persisted separately from the tuning banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidConfig {
    /// Processing denominator for the PID loop vs the gyro sampling rate.
    pub pid_process_denom: u8,
    /// Enables the external pidsum runaway disarm logic.
    pub runaway_takeoff_prevention: bool,
    /// Delay in ms of in-flight conditions before deactivation.
    pub runaway_takeoff_deactivate_delay: u16,
    /// Minimum throttle percent required during the deactivation phase.
    pub runaway_takeoff_deactivate_throttle: u8,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            pid_process_denom: 2,
            runaway_takeoff_prevention: true,
            runaway_takeoff_deactivate_delay: 500,
            runaway_takeoff_deactivate_throttle: 25,
        }
    }
}
