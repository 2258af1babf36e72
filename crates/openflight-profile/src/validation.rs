//! Profile validation
//!
//! The external configuration layer rejects out-of-range values before they
//! reach coefficient derivation; this module is that contract. The control
//! core trusts a validated profile and only guards derived floating-point
//! quantities.

use crate::types::{PidConfig, PidProfile, MAX_PID_PROCESS_DENOM, MAX_PROFILE_NAME_LENGTH};
use crate::{ProfileError, ProfileResult};

/// Clamp on the pidsum limit fields, lower bound.
pub const PIDSUM_LIMIT_MIN: u16 = 100;
/// Clamp on the pidsum limit fields, upper bound.
pub const PIDSUM_LIMIT_MAX: u16 = 1000;

/// Validate a tuning profile against its documented field ranges.
///
/// # Errors
///
/// Returns [`ProfileError::ValidationError`] naming the first field that is
/// out of range.
pub fn validate_profile(profile: &PidProfile) -> ProfileResult<()> {
    if profile.profile_name.len() > MAX_PROFILE_NAME_LENGTH {
        return Err(ProfileError::ValidationError(format!(
            "Profile name must be at most {MAX_PROFILE_NAME_LENGTH} bytes"
        )));
    }

    for limit in [profile.pid_sum_limit, profile.pid_sum_limit_yaw] {
        if !(PIDSUM_LIMIT_MIN..=PIDSUM_LIMIT_MAX).contains(&limit) {
            return Err(ProfileError::ValidationError(format!(
                "pidsum limit must be between {PIDSUM_LIMIT_MIN} and {PIDSUM_LIMIT_MAX}"
            )));
        }
    }

    if profile.iterm_windup_point_percent > 100 {
        return Err(ProfileError::ValidationError(
            "Iterm windup point must be between 0 and 100 percent".to_string(),
        ));
    }

    if profile.level_angle_limit < 10 || profile.level_angle_limit > 90 {
        return Err(ProfileError::ValidationError(
            "Level angle limit must be between 10 and 90 degrees".to_string(),
        ));
    }

    if profile.horizon_transition > 100 {
        return Err(ProfileError::ValidationError(
            "Horizon transition must be between 0 and 100 percent".to_string(),
        ));
    }

    if profile.dterm_notch_hz > 0 && profile.dterm_notch_cutoff >= profile.dterm_notch_hz {
        return Err(ProfileError::ValidationError(
            "D-term notch cutoff must be below its center frequency".to_string(),
        ));
    }

    if profile.dyn_lpf_dterm_min_hz > 0
        && profile.dyn_lpf_dterm_max_hz < profile.dyn_lpf_dterm_min_hz
    {
        return Err(ProfileError::ValidationError(
            "Dynamic lowpass max cutoff must be at least its min cutoff".to_string(),
        ));
    }

    for (axis, d_min) in profile.d_min.iter().enumerate() {
        if *d_min > 0 && *d_min > profile.pid[axis].d {
            return Err(ProfileError::ValidationError(format!(
                "d_min on axis {axis} must not exceed the axis D gain"
            )));
        }
    }

    if profile.thrust_linearization > 150 {
        return Err(ProfileError::ValidationError(
            "Thrust linearization must be between 0 and 150".to_string(),
        ));
    }

    if profile.vbat_sag_compensation > 150 {
        return Err(ProfileError::ValidationError(
            "Vbat sag compensation must be between 0 and 150".to_string(),
        ));
    }

    if profile.motor_output_limit == 0 || profile.motor_output_limit > 100 {
        return Err(ProfileError::ValidationError(
            "Motor output limit must be between 1 and 100 percent".to_string(),
        ));
    }

    if profile.launch_control_throttle_percent > 50 {
        return Err(ProfileError::ValidationError(
            "Launch control throttle must be between 0 and 50 percent".to_string(),
        ));
    }

    if profile.dterm_measurement_slider > 100 {
        return Err(ProfileError::ValidationError(
            "D-term measurement slider must be between 0 and 100".to_string(),
        ));
    }

    if profile.dterm_dynlpf2_enable && profile.dterm_dynlpf2_fmax < profile.dterm_dynlpf2_fmin {
        return Err(ProfileError::ValidationError(
            "Dynamic lowpass 2 fmax must be at least fmin".to_string(),
        ));
    }

    Ok(())
}

/// Validate the loop-rate configuration.
///
/// # Errors
///
/// Returns [`ProfileError::ValidationError`] if the process denominator is
/// out of range.
pub fn validate_config(config: &PidConfig) -> ProfileResult<()> {
    if config.pid_process_denom == 0 || config.pid_process_denom > MAX_PID_PROCESS_DENOM {
        return Err(ProfileError::ValidationError(format!(
            "PID process denom must be between 1 and {MAX_PID_PROCESS_DENOM}"
        )));
    }
    Ok(())
}
