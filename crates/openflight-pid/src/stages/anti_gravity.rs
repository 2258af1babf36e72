//! Anti-Gravity
//!
//! Sudden throttle changes unload the props and the craft sags or surges
//! before the integrator catches up. This stage watches a high-passed copy
//! of the throttle; while the transient lasts, it multiplies the I gain so
//! the integrator reacts immediately.

use openflight_filters::Pt1State;
use openflight_profile::AntiGravityMode;

use crate::consts::{
    ANTI_GRAVITY_SMOOTH_FILTER_CUTOFF, ANTI_GRAVITY_THROTTLE_FILTER_CUTOFF,
    ITERM_ACCELERATOR_GAIN_MAX, ITERM_ACCELERATOR_GAIN_OFF,
};

/// State for the anti-gravity stage.
#[derive(Debug, Clone, Copy)]
pub struct AntiGravityState {
    mode: AntiGravityMode,
    enabled: bool,
    throttle_lpf: Pt1State,
    smooth_lpf: Pt1State,
    throttle_hpf: f32,
    /// Accelerator gain in profile thousandths (1000 = 1.0x).
    accelerator_gain: u16,
    /// Normalized throttle-transient threshold for step mode.
    threshold: f32,
    /// Current I multiplier (1.0 = no boost).
    iterm_accelerator: f32,
    /// Multiplier above which the stage reports itself active.
    active_cutoff: f32,
}

impl AntiGravityState {
    /// Create the stage from profile settings.
    pub fn new(
        mode: AntiGravityMode,
        accelerator_gain: u16,
        throttle_threshold: u16,
        dt: f32,
    ) -> Self {
        let gain = accelerator_gain.clamp(ITERM_ACCELERATOR_GAIN_OFF, ITERM_ACCELERATOR_GAIN_MAX);
        Self {
            mode,
            enabled: gain > 1000,
            throttle_lpf: Pt1State::new(ANTI_GRAVITY_THROTTLE_FILTER_CUTOFF, dt),
            smooth_lpf: Pt1State::new(ANTI_GRAVITY_SMOOTH_FILTER_CUTOFF, dt),
            throttle_hpf: 0.0,
            accelerator_gain: gain,
            threshold: f32::from(throttle_threshold) / 1000.0,
            iterm_accelerator: 1.0,
            active_cutoff: 1.0 + 0.25 * (f32::from(gain) / 1000.0 - 1.0).max(0.0),
        }
    }

    /// Feed the current throttle and update the transient detector.
    pub fn update_throttle_filter(&mut self, throttle: f32) {
        self.throttle_hpf = throttle - self.throttle_lpf.apply(throttle);
    }

    /// Compute this tick's I-gain multiplier.
    pub fn update(&mut self, throttle: f32) -> f32 {
        self.update_throttle_filter(throttle);
        if !self.enabled {
            self.iterm_accelerator = 1.0;
            return self.iterm_accelerator;
        }

        let max_gain = f32::from(self.accelerator_gain) / 1000.0;
        self.iterm_accelerator = match self.mode {
            AntiGravityMode::Smooth => {
                // Ramp continuously with the transient magnitude; the
                // smoothing filter stretches the boost over the sag.
                let raw = 1.0 + self.throttle_hpf.abs() * 10.0 * (max_gain - 1.0);
                self.smooth_lpf.apply(raw).clamp(1.0, max_gain)
            }
            AntiGravityMode::Step => {
                if self.throttle_hpf.abs() > self.threshold {
                    max_gain
                } else {
                    1.0
                }
            }
        };
        self.iterm_accelerator
    }

    /// Externally override the accelerator gain (profile thousandths).
    /// Clamped to the legal range regardless of input.
    pub fn set_accelerator_gain(&mut self, gain: u16) {
        self.accelerator_gain =
            gain.clamp(ITERM_ACCELERATOR_GAIN_OFF, ITERM_ACCELERATOR_GAIN_MAX);
        self.enabled = self.accelerator_gain > 1000;
        self.active_cutoff =
            1.0 + 0.25 * (f32::from(self.accelerator_gain) / 1000.0 - 1.0).max(0.0);
    }

    /// Externally enable/disable the stage.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled && self.accelerator_gain > 1000;
    }

    /// Current I multiplier.
    pub fn iterm_accelerator(&self) -> f32 {
        self.iterm_accelerator
    }

    /// Configured accelerator gain in profile thousandths.
    pub fn accelerator_gain(&self) -> u16 {
        self.accelerator_gain
    }

    /// Configured ramping mode.
    pub fn mode(&self) -> AntiGravityMode {
        self.mode
    }

    /// Whether the boost is currently substantial (telemetry/OSD).
    pub fn is_active(&self) -> bool {
        self.iterm_accelerator > self.active_cutoff
    }

    /// Reset filters and multiplier, e.g. on disarm.
    pub fn reset(&mut self) {
        self.throttle_lpf.state = 0.0;
        self.smooth_lpf.state = 0.0;
        self.throttle_hpf = 0.0;
        self.iterm_accelerator = 1.0;
    }
}
