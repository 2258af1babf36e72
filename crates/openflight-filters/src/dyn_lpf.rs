//! Dynamic Low-Pass Filtering
//!
//! Two mechanisms loosen D-term filtering when the airframe is quiet and
//! tighten tracking when it is maneuvering:
//!
//! - [`dyn_lpf_cutoff_hz`] maps throttle through an expo curve to a cutoff
//!   between a configured min and max; the control loop feeds the result to
//!   the D-term low-pass slots every tick.
//! - [`DynLpf2State`] is a cascaded two-stage low-pass whose cutoff follows
//!   the measured signal dynamics directly, with a throttle term that opens
//!   the filter at high throttle.

use crate::pt1::Pt1State;

/// Throttle-adaptive cutoff curve.
///
/// `curve = t*(1-t)*(expo/10) + t`, mapped onto `[min_hz, max_hz]`.
/// Returns exactly `min_hz` at `throttle == 0` and `max_hz` at
/// `throttle == 1`; monotone non-decreasing in throttle for `expo == 0`,
/// and continuous everywhere.
///
/// # Arguments
///
/// * `throttle` - Current throttle in `[0, 1]` (clamped)
/// * `min_hz` - Cutoff at zero throttle
/// * `max_hz` - Cutoff at full throttle
/// * `expo` - Curve shape in profile units (tenths)
///
/// # Example
///
/// ```
/// use openflight_filters::dyn_lpf_cutoff_hz;
///
/// assert!((dyn_lpf_cutoff_hz(0.0, 70, 170, 0) - 70.0).abs() < 1e-6);
/// assert!((dyn_lpf_cutoff_hz(1.0, 70, 170, 0) - 170.0).abs() < 1e-6);
/// ```
pub fn dyn_lpf_cutoff_hz(throttle: f32, min_hz: u16, max_hz: u16, expo: u8) -> f32 {
    let throttle = if throttle.is_finite() {
        throttle.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let expo_f = f32::from(expo) / 10.0;
    let curve = throttle * (1.0 - throttle) * expo_f + throttle;
    (f32::from(max_hz) - f32::from(min_hz)) * curve + f32::from(min_hz)
}

/// Configuration for the two-stage dynamic low-pass.
#[derive(Copy, Clone, Debug)]
pub struct DynLpf2Config {
    /// Cutoff floor in Hz.
    pub fmin_hz: f32,
    /// Cutoff ceiling in Hz.
    pub fmax_hz: f32,
    /// Gain applied to the innovation (|input - output|) when slewing the
    /// cutoff upward.
    pub gain: f32,
    /// Cutoff of the low-pass that smooths the cutoff itself, in Hz.
    pub fc_fc_hz: f32,
    /// Innovation magnitude below which the cutoff re-centers on the floor.
    pub center_threshold: f32,
    /// Throttle above which the throttle term starts opening the filter,
    /// in `[0, 1]`.
    pub throttle_threshold: f32,
    /// Hz of additional cutoff per unit of throttle above the threshold.
    pub throttle_gain: f32,
    /// Run the signal path as two cascaded stages instead of one.
    pub two_stage: bool,
}

/// State for the dynamics-following low-pass.
///
/// The signal path is one or two cascaded PT1 stages at a shared cutoff.
/// Each tick the cutoff target is derived from the innovation (how far the
/// input has moved from the filtered output, scaled by `gain`) plus the
/// throttle term, clamped to `[fmin, fmax]`, then smoothed through its own
/// PT1 (`fc_fc_hz`) so the cutoff never steps audibly.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) time complexity
/// - Bounded execution time
#[derive(Copy, Clone, Debug)]
pub struct DynLpf2State {
    config: DynLpf2Config,
    stage1: Pt1State,
    stage2: Pt1State,
    cutoff_lpf: Pt1State,
    cutoff_hz: f32,
    dt: f32,
}

impl DynLpf2State {
    /// Create a new dynamic low-pass from its configuration.
    ///
    /// The cutoff starts at the floor and the cutoff smoother is primed so
    /// the first ticks do not sweep from zero.
    pub fn new(config: DynLpf2Config, dt: f32) -> Self {
        let mut cutoff_lpf = Pt1State::new(config.fc_fc_hz, dt);
        cutoff_lpf.state = config.fmin_hz;
        Self {
            config,
            stage1: Pt1State::new(config.fmin_hz, dt),
            stage2: Pt1State::new(config.fmin_hz, dt),
            cutoff_lpf,
            cutoff_hz: config.fmin_hz,
            dt,
        }
    }

    /// Current (smoothed) cutoff in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Apply the filter to one sample.
    ///
    /// `throttle` is the current normalized throttle, used only for the
    /// filter-opening term.
    #[inline]
    pub fn apply(&mut self, input: f32, throttle: f32) -> f32 {
        let cfg = &self.config;

        let innovation = (input - self.stage1.output()).abs() * cfg.gain;
        let mut target = if innovation < cfg.center_threshold {
            cfg.fmin_hz
        } else {
            cfg.fmin_hz + innovation
        };
        if throttle > cfg.throttle_threshold {
            target += (throttle - cfg.throttle_threshold) * cfg.throttle_gain;
        }
        let target = target.clamp(cfg.fmin_hz, cfg.fmax_hz);

        self.cutoff_hz = self.cutoff_lpf.apply(target);
        self.stage1.set_cutoff(self.cutoff_hz, self.dt);

        let mut out = self.stage1.apply(input);
        if cfg.two_stage {
            self.stage2.set_cutoff(self.cutoff_hz, self.dt);
            out = self.stage2.apply(out);
        }
        out
    }

    /// Reset the delay lines, keeping the configuration.
    pub fn reset(&mut self) {
        self.stage1.state = 0.0;
        self.stage2.state = 0.0;
        self.cutoff_lpf.state = self.config.fmin_hz;
        self.cutoff_hz = self.config.fmin_hz;
    }
}
