//! Low-Pass Filter Variants
//!
//! The D-term low-pass stages can be configured per profile as either a PT1
//! or a biquad section. The closed set of variants lives behind one `apply`,
//! selected per-axis by configuration at derivation time.

use crate::biquad::BiquadState;
use crate::pt1::Pt1State;

/// Which low-pass implementation a filter slot uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LowpassKind {
    /// Single-pole low-pass (cheapest, softest rolloff).
    #[default]
    Pt1,
    /// Biquad low-pass at Butterworth Q (steeper rolloff, more delay).
    Biquad,
}

/// A configurable low-pass slot: bypass, PT1 or biquad.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) `apply`
/// - Bounded execution time
#[derive(Copy, Clone, Debug)]
pub enum LowpassFilter {
    /// No filtering; `apply` returns the input unchanged.
    Bypass,
    /// Single-pole variant.
    Pt1(Pt1State),
    /// Biquad variant.
    Biquad(BiquadState),
}

impl LowpassFilter {
    /// Create a low-pass slot for the given kind and cutoff.
    ///
    /// A zero cutoff produces a bypass slot regardless of kind.
    ///
    /// # Arguments
    ///
    /// * `kind` - Implementation selected by the profile
    /// * `cutoff_hz` - Cutoff frequency in Hz (0 disables)
    /// * `sample_rate_hz` - Loop rate in Hz
    pub fn new(kind: LowpassKind, cutoff_hz: f32, sample_rate_hz: f32) -> Self {
        if cutoff_hz <= 0.0 || sample_rate_hz <= 0.0 {
            return Self::Bypass;
        }
        match kind {
            LowpassKind::Pt1 => Self::Pt1(Pt1State::new(cutoff_hz, 1.0 / sample_rate_hz)),
            LowpassKind::Biquad => Self::Biquad(BiquadState::lowpass(cutoff_hz, sample_rate_hz)),
        }
    }

    /// Apply the filter to one sample.
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        match self {
            Self::Bypass => input,
            Self::Pt1(state) => state.apply(input),
            Self::Biquad(state) => state.apply(input),
        }
    }

    /// Retune the cutoff in place, preserving the delay line.
    ///
    /// A bypass slot stays bypass: the variant is fixed at configuration
    /// time, only the cutoff moves at runtime.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate_hz: f32) {
        match self {
            Self::Bypass => {}
            Self::Pt1(state) => state.set_cutoff(cutoff_hz, 1.0 / sample_rate_hz),
            Self::Biquad(state) => state.configure_lowpass(cutoff_hz, sample_rate_hz),
        }
    }

    /// True when the slot filters nothing.
    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass)
    }
}

impl Default for LowpassFilter {
    fn default() -> Self {
        Self::Bypass
    }
}
