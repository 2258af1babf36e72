//! Fixed scale constants and tuning invariants of the control loop.
//!
//! The PID scale factors keep the integer profile gains in a comfortable
//! tunable range; they are part of the tuning compatibility contract and
//! must not change between releases.

/// Scale from the integer P gain to the working coefficient.
pub const PTERM_SCALE: f32 = 0.032029;
/// Scale from the integer I gain to the working coefficient.
pub const ITERM_SCALE: f32 = 0.244381;
/// Scale from the integer D gain to the working coefficient.
pub const DTERM_SCALE: f32 = 0.000529;

/// Scale factor replacing the Kd component of the feedforward calculation.
/// Gives the same feel as the previous Kd default of 26 (26 * DTERM_SCALE).
pub const FEEDFORWARD_SCALE: f32 = 0.013754;

/// Full iterm suppression in setpoint mode at a high-passed setpoint rate
/// above this, deg/s.
pub const ITERM_RELAX_SETPOINT_THRESHOLD: f32 = 40.0;
/// Default iterm-relax high-pass corner, Hz.
pub const ITERM_RELAX_CUTOFF_DEFAULT: u8 = 15;

/// Anti-gravity accelerator gain floor (profile thousandths).
pub const ITERM_ACCELERATOR_GAIN_OFF: u16 = 0;
/// Anti-gravity accelerator gain ceiling (profile thousandths).
pub const ITERM_ACCELERATOR_GAIN_MAX: u16 = 30000;
/// Anti-gravity throttle low-pass cutoff, Hz (its complement is the
/// high-pass that detects throttle transients).
pub const ANTI_GRAVITY_THROTTLE_FILTER_CUTOFF: f32 = 15.0;
/// Smoothing cutoff for the smooth-mode accelerator, Hz.
pub const ANTI_GRAVITY_SMOOTH_FILTER_CUTOFF: f32 = 3.0;

/// Scaling between the internal pidsum range and mixer input.
pub const PID_MIXER_SCALING: f32 = 1000.0;

/// D-min activity range filter cutoff, Hz.
pub const D_MIN_RANGE_HZ: f32 = 85.0;
/// D-min factor smoothing cutoff, Hz.
pub const D_MIN_LOWPASS_HZ: f32 = 35.0;
/// Gyro-activity gain factor for the D boost.
pub const D_MIN_GAIN_FACTOR: f32 = 0.00008;
/// Setpoint-activity gain factor for the D boost.
pub const D_MIN_SETPOINT_GAIN_FACTOR: f32 = 0.00008;

/// Time the crash pattern must persist before the detector fires, ms.
pub const CRASH_CONFIRM_MS: f32 = 60.0;

/// Ceiling on commanded setpoint rates, deg/s. Feedforward's max-rate limit
/// is expressed as a percentage of this.
pub const SETPOINT_RATE_LIMIT: f32 = 1998.0;

/// Attitude-error span over which the level-low gains fade into the
/// level-high gains, degrees, before the horizon transition scales it.
pub const LEVEL_FADE_BASE_DEG: f32 = 175.0;
