//! Crash Detection
//!
//! A crash shows up as a violent D-term and gyro excursion while the pilot
//! is commanding almost nothing. Both magnitudes must exceed their
//! thresholds, with the setpoint below its own, for a sustained run of
//! ticks before the detector fires; intentional flips command large
//! setpoints and never qualify.

use openflight_profile::{CrashRecovery, PidProfile};
use tracing::warn;

use crate::consts::CRASH_CONFIRM_MS;

/// State for the crash detector.
#[derive(Debug, Clone, Copy)]
pub struct CrashDetector {
    dterm_threshold: f32,
    gyro_threshold: f32,
    setpoint_threshold: f32,
    recovery: CrashRecovery,
    confirm_ticks: u32,
    counter: u32,
    detected: bool,
    disarm_requested: bool,
}

impl CrashDetector {
    /// Derive the detector from the profile thresholds and loop rate.
    pub fn from_profile(profile: &PidProfile, pid_frequency: f32) -> Self {
        Self {
            dterm_threshold: f32::from(profile.crash_dthreshold),
            gyro_threshold: f32::from(profile.crash_gthreshold),
            setpoint_threshold: f32::from(profile.crash_setpoint_threshold),
            recovery: profile.crash_recovery,
            confirm_ticks: ((CRASH_CONFIRM_MS / 1000.0) * pid_frequency).max(1.0) as u32,
            counter: 0,
            detected: false,
            disarm_requested: false,
        }
    }

    /// Feed one tick's worst-case magnitudes.
    ///
    /// `dterm` is the largest per-axis |D| in deg/s/s before gain scaling,
    /// `gyro_rate` the largest |gyro| in deg/s and `setpoint` the largest
    /// commanded |rate| in deg/s.
    pub fn update(&mut self, dterm: f32, gyro_rate: f32, setpoint: f32) {
        if self.detected {
            return;
        }

        let pattern = dterm.abs() > self.dterm_threshold
            && gyro_rate.abs() > self.gyro_threshold
            && setpoint.abs() < self.setpoint_threshold;

        if pattern {
            self.counter += 1;
            if self.counter >= self.confirm_ticks {
                self.detected = true;
                if self.recovery == CrashRecovery::Disarm {
                    self.disarm_requested = true;
                }
                warn!(
                    dterm,
                    gyro_rate,
                    recovery = ?self.recovery,
                    "crash detected"
                );
            }
        } else {
            self.counter = 0;
        }
    }

    /// True once a crash has been confirmed.
    pub fn detected(&self) -> bool {
        self.detected
    }

    /// True when the configured recovery wants the craft disarmed.
    pub fn disarm_requested(&self) -> bool {
        self.disarm_requested
    }

    /// Ticks the crash pattern must persist before firing.
    pub fn confirm_ticks(&self) -> u32 {
        self.confirm_ticks
    }

    /// Clear detection state, e.g. on rearm.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.detected = false;
        self.disarm_requested = false;
    }
}
