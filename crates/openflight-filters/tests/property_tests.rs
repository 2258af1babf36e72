//! Property-Based Tests for Filter Primitives
//!
//! These verify filter behavior across a wide range of inputs.

use openflight_filters::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn pt1_output_always_finite(input in -1e4f32..1e4f32, cutoff in 1.0f32..1000.0f32) {
        let mut state = Pt1State::new(cutoff, 1.0 / 8000.0);
        let out = state.apply(input);
        prop_assert!(out.is_finite());
    }

    #[test]
    fn pt1_output_between_state_and_input(input in -1e3f32..1e3f32, cutoff in 1.0f32..1000.0f32) {
        let mut state = Pt1State::new(cutoff, 1.0 / 8000.0);
        let out = state.apply(input);
        let lo = 0.0f32.min(input) - 1e-3;
        let hi = 0.0f32.max(input) + 1e-3;
        prop_assert!(out >= lo && out <= hi);
    }

    #[test]
    fn pt1_deterministic(input in -1e3f32..1e3f32) {
        let mut a = Pt1State::new(150.0, 1.0 / 8000.0);
        let mut b = Pt1State::new(150.0, 1.0 / 8000.0);
        prop_assert!((a.apply(input) - b.apply(input)).abs() < 1e-9);
    }

    #[test]
    fn biquad_lowpass_stable_for_valid_cutoffs(cutoff in 1.0f32..3900.0f32) {
        let state = BiquadState::lowpass(cutoff, 8000.0);
        prop_assert!(state.is_stable());
    }

    #[test]
    fn biquad_notch_stable_for_valid_configs(
        center in 100.0f32..1000.0f32,
        ratio in 0.1f32..0.9f32
    ) {
        let cutoff = center * ratio;
        let state = BiquadState::notch(center, cutoff, 8000.0);
        prop_assert!(state.is_stable());
    }

    #[test]
    fn lowpass_slot_output_finite(
        input in -1e4f32..1e4f32,
        cutoff in 0.0f32..1000.0f32,
        use_biquad in any::<bool>()
    ) {
        let kind = if use_biquad { LowpassKind::Biquad } else { LowpassKind::Pt1 };
        let mut slot = LowpassFilter::new(kind, cutoff, 8000.0);
        prop_assert!(slot.apply(input).is_finite());
    }

    #[test]
    fn dyn_lpf_cutoff_within_bounds(
        throttle in -0.5f32..1.5f32,
        min in 10u16..200u16,
        span in 0u16..500u16,
        expo in 0u8..10u8
    ) {
        let max = min + span;
        let hz = dyn_lpf_cutoff_hz(throttle, min, max, expo);
        // The expo curve overshoots at mid-throttle for large expo by design
        // of the quadratic term, but never below min for expo in tested range.
        prop_assert!(hz >= f32::from(min) - 1e-3);
        prop_assert!(hz.is_finite());
    }

    #[test]
    fn dyn_lpf_cutoff_endpoints_exact(min in 10u16..200u16, span in 1u16..500u16, expo in 0u8..26u8) {
        let max = min + span;
        prop_assert!((dyn_lpf_cutoff_hz(0.0, min, max, expo) - f32::from(min)).abs() < 1e-3);
        prop_assert!((dyn_lpf_cutoff_hz(1.0, min, max, expo) - f32::from(max)).abs() < 1e-3);
    }

    #[test]
    fn dyn_lpf_cutoff_monotone_for_zero_expo(
        t1 in 0.0f32..1.0f32,
        t2 in 0.0f32..1.0f32
    ) {
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let a = dyn_lpf_cutoff_hz(lo, 70, 170, 0);
        let b = dyn_lpf_cutoff_hz(hi, 70, 170, 0);
        prop_assert!(b >= a - 1e-4);
    }

    #[test]
    fn dynlpf2_cutoff_always_in_range(inputs in proptest::collection::vec(-1e4f32..1e4f32, 1..200)) {
        let config = DynLpf2Config {
            fmin_hz: 70.0,
            fmax_hz: 450.0,
            gain: 40.0,
            fc_fc_hz: 15.0,
            center_threshold: 10.0,
            throttle_threshold: 0.3,
            throttle_gain: 200.0,
            two_stage: true,
        };
        let mut state = DynLpf2State::new(config, 1.0 / 8000.0);
        for input in inputs {
            let out = state.apply(input, 0.5);
            prop_assert!(out.is_finite());
            prop_assert!(state.cutoff_hz() >= 70.0 && state.cutoff_hz() <= 450.0);
        }
    }
}
