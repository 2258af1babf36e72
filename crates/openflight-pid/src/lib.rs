//! Real-Time Attitude-Control Core for OpenFlight
//!
//! This crate implements the per-tick algorithm that converts desired
//! rotational rate (setpoint) and measured rotational rate (gyro) into
//! bounded motor-mixer drive commands on three axes, plus an angle-hold
//! ("level") mode, at loop rates of 2-8 kHz.
//!
//! # Architecture
//!
//! - [`PidRuntime`] is the single owned state container: coefficients,
//!   filter instances and stage state. No ambient globals; callers create
//!   it once and thread `&mut` through every tick.
//! - [`stages`] holds the compensation stages (iterm-relax, absolute
//!   control, anti-gravity, D-min, feedforward, iterm rotation, crash
//!   detection, launch control, thrust linearization), each an independent
//!   transform on explicit state. Optional stages are selected at
//!   derivation time and carried as `Option`.
//! - [`PidRuntime::run_control_loop`] composes the stages in a fixed order
//!   for each axis and produces [`PidAxisData`] for the external mixer.
//! - [`IdleGovernor`] is the slow minimum-RPM hold, decoupled from the
//!   rate loop.
//!
//! # Concurrency model
//!
//! Single-threaded, run-to-completion: the loop is one non-reentrant task
//! invoked once per tick and nothing inside a tick suspends or blocks.
//! Mutual exclusion is ownership, not locking - profile swaps and resets
//! take `&mut PidRuntime` and therefore cannot interleave with a tick.
//!
//! # Error handling
//!
//! The hot loop returns no errors. Divisions are guarded, every sum and
//! gain is clamped to its profile-declared bound, and non-finite inputs
//! are replaced with zeros and counted in [`RtFaultCounters`]. Fallible
//! operations (profile validation, derivation) happen before the loop
//! runs.
//!
//! # Example
//!
//! ```
//! use openflight_pid::{PidRuntime, TickInput};
//! use openflight_profile::{PidConfig, PidProfile};
//!
//! let profile = PidProfile::named("default");
//! let config = PidConfig::default();
//! let mut runtime = PidRuntime::new(&profile, &config, 8000.0)?;
//! runtime.set_stabilisation(true);
//!
//! let input = TickInput {
//!     setpoint: [120.0, 0.0, 0.0],
//!     gyro: [80.0, 0.0, 0.0],
//!     throttle: 0.4,
//!     armed: true,
//!     ..TickInput::default()
//! };
//! let output = runtime.run_control_loop(&input);
//! assert!(output[0].sum.abs() <= 500.0);
//! # Ok::<(), openflight_pid::PidInitError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod axis;
pub mod coefficients;
pub mod consts;
pub mod controller;
pub mod error;
pub mod idle;
pub mod runtime;
pub mod stages;

pub use axis::{Axis, PidAxisData};
pub use coefficients::PidCoefficient;
pub use controller::TickInput;
pub use error::{PidInitError, RtFault, RtFaultCounters};
pub use idle::IdleGovernor;
pub use runtime::PidRuntime;
