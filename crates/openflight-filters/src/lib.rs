//! RT-Safe Filter Primitives for OpenFlight
//!
//! This crate provides the filter primitives used by the attitude-control
//! loop. All filters are designed to run inside a fixed-period gyro/PID tick
//! (2-8 kHz) with strict timing requirements.
//!
//! # Overview
//!
//! The filter set includes:
//! - **PT1**: single-pole low-pass, the workhorse for D-term smoothing,
//!   iterm-relax high-pass derivation and throttle filtering
//! - **Biquad**: Direct Form I second-order section with low-pass and notch
//!   configurations for D-term noise rejection
//! - **Lowpass**: a closed set of low-pass variants (`Pt1`/`Biquad`/bypass)
//!   behind one `apply`, selected per-axis by profile configuration
//! - **DynLpf2**: cascaded two-stage low-pass whose cutoff follows measured
//!   signal dynamics and throttle
//! - **Cutoff curve**: the throttle-adaptive cutoff mapping used to retune
//!   the D-term low-pass every tick
//!
//! # RT Safety Guarantees
//!
//! All filter implementations are RT-safe:
//! - No heap allocations in filter hot paths
//! - O(1) time complexity for all operations
//! - Bounded execution time
//! - No syscalls or I/O in filter functions
//! - All state types are `#[repr(C)]` for stable ABI
//!
//! # Example
//!
//! ```
//! use openflight_filters::prelude::*;
//!
//! // Create filter states at initialization time
//! let dt = 1.0 / 8000.0;
//! let mut dterm_lpf = Pt1State::new(150.0, dt);
//! let mut dterm_notch = BiquadState::notch(260.0, 160.0, 8000.0);
//!
//! // In the control loop (8kHz):
//! let sample = 42.0;
//! let filtered = dterm_lpf.apply(dterm_notch.apply(sample));
//! assert!(filtered.is_finite());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod biquad;
pub mod dyn_lpf;
pub mod lowpass;
pub mod prelude;
pub mod pt1;
pub mod state;

pub use biquad::BiquadState;
pub use dyn_lpf::{dyn_lpf_cutoff_hz, DynLpf2Config, DynLpf2State};
pub use lowpass::{LowpassFilter, LowpassKind};
pub use pt1::Pt1State;
pub use state::FilterState;
