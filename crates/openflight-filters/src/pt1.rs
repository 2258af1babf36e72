//! PT1 Filter (Single-Pole Low-Pass)
//!
//! This module provides the first-order low-pass filter used throughout the
//! control loop: D-term smoothing, the iterm-relax setpoint low-pass (whose
//! complement is the high-pass), anti-gravity throttle filtering and the
//! D-min activity smoother.

use core::f32::consts::PI;

/// State for a PT1 (single-pole) low-pass filter.
///
/// The filter implements `y += k * (x - y)` with `k = dt / (rc + dt)` and
/// `rc = 1 / (2*pi*f_c)`.
///
/// # RT Safety
///
/// - `#[repr(C)]` for stable ABI
/// - No heap allocations
/// - O(1) time complexity
/// - Bounded execution time
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct Pt1State {
    /// Filter gain in `(0, 1]`. A gain of 1.0 is a pass-through.
    pub k: f32,
    /// Current filter output y[n-1].
    pub state: f32,
}

impl Pt1State {
    /// Create a new PT1 filter state.
    ///
    /// A zero or negative cutoff disables filtering (pass-through).
    ///
    /// # Arguments
    ///
    /// * `cutoff_hz` - Cutoff frequency in Hz
    /// * `dt` - Sample period in seconds (e.g. 1/8000 for an 8kHz loop)
    ///
    /// # Example
    ///
    /// ```
    /// use openflight_filters::Pt1State;
    ///
    /// let state = Pt1State::new(150.0, 1.0 / 8000.0);
    /// assert!(state.k > 0.0 && state.k < 1.0);
    /// ```
    pub fn new(cutoff_hz: f32, dt: f32) -> Self {
        Self {
            k: Self::gain(cutoff_hz, dt),
            state: 0.0,
        }
    }

    /// Create a pass-through filter (no filtering).
    pub fn bypass() -> Self {
        Self { k: 1.0, state: 0.0 }
    }

    /// Compute the PT1 gain for a cutoff frequency and sample period.
    ///
    /// Returns 1.0 (pass-through) for non-positive or non-finite cutoffs.
    pub fn gain(cutoff_hz: f32, dt: f32) -> f32 {
        if cutoff_hz <= 0.0 || dt <= 0.0 || !cutoff_hz.is_finite() || !dt.is_finite() {
            return 1.0;
        }
        let rc = 1.0 / (2.0 * PI * cutoff_hz);
        dt / (rc + dt)
    }

    /// Retune the cutoff in place without clearing the delay state.
    ///
    /// Used by the throttle-adaptive D-term low-pass, which changes cutoff
    /// every tick while the signal keeps flowing.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, dt: f32) {
        self.k = Self::gain(cutoff_hz, dt);
    }

    /// Apply the filter to one sample.
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        self.state += self.k * (input - self.state);
        self.state
    }

    /// Current output without advancing the filter.
    #[inline]
    pub fn output(&self) -> f32 {
        self.state
    }
}

impl Default for Pt1State {
    fn default() -> Self {
        Self::bypass()
    }
}
