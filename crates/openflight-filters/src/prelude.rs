//! Prelude for convenient imports.
//!
//! ```
//! use openflight_filters::prelude::*;
//! ```

pub use crate::biquad::BiquadState;
pub use crate::dyn_lpf::{dyn_lpf_cutoff_hz, DynLpf2Config, DynLpf2State};
pub use crate::lowpass::{LowpassFilter, LowpassKind};
pub use crate::pt1::Pt1State;
pub use crate::state::FilterState;
