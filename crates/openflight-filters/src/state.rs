//! Filter State Types
//!
//! This module aggregates the filter state types and the shared reset trait.

pub use crate::biquad::BiquadState;
pub use crate::dyn_lpf::DynLpf2State;
pub use crate::lowpass::LowpassFilter;
pub use crate::pt1::Pt1State;

/// Filter trait for common filter operations.
///
/// All filters implement this trait for consistent interface.
pub trait FilterState: Copy + Clone + core::fmt::Debug {
    /// Reset the filter's delay state to initial values, keeping its tuning.
    fn reset(&mut self);
}

impl FilterState for Pt1State {
    fn reset(&mut self) {
        self.state = 0.0;
    }
}

impl FilterState for BiquadState {
    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl FilterState for LowpassFilter {
    fn reset(&mut self) {
        match self {
            LowpassFilter::Bypass => {}
            LowpassFilter::Pt1(state) => state.reset(),
            LowpassFilter::Biquad(state) => state.reset(),
        }
    }
}

impl FilterState for DynLpf2State {
    fn reset(&mut self) {
        DynLpf2State::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pt1_reset_clears_state_keeps_gain() {
        let mut state = Pt1State::new(100.0, 1.0 / 8000.0);
        let k = state.k;
        state.apply(1.0);
        FilterState::reset(&mut state);
        assert!(state.output().abs() < 1e-9);
        assert!((state.k - k).abs() < 1e-9);
    }

    #[test]
    fn test_biquad_reset_clears_delay_line() {
        let mut state = BiquadState::lowpass(100.0, 8000.0);
        state.apply(1.0);
        state.apply(1.0);
        FilterState::reset(&mut state);
        assert!(state.x1.abs() < 1e-9);
        assert!(state.y1.abs() < 1e-9);
        // Coefficients survive
        assert!(state.is_stable());
    }
}
