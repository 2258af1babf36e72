//! Compensation Stages
//!
//! Each stage is an independent transform with explicit state, composed by
//! the per-axis control loop in a fixed order. Optional stages are selected
//! at derivation time (carried as `Option` in the runtime) instead of being
//! compiled in and out.

pub mod absolute_control;
pub mod anti_gravity;
pub mod boost;
pub mod crash;
pub mod d_min;
pub mod feedforward;
pub mod iterm_relax;
pub mod iterm_rotation;
pub mod launch_control;
pub mod level;
pub mod throttle_boost;
pub mod thrust_linearization;

pub use absolute_control::{AbsoluteControlConfig, AbsoluteControlState};
pub use anti_gravity::AntiGravityState;
pub use boost::BoostGains;
pub use crash::CrashDetector;
pub use d_min::DMinState;
pub use feedforward::FeedforwardState;
pub use iterm_relax::ItermRelaxState;
pub use iterm_rotation::{rotate_iterm_and_axis_error, rotate_vector};
pub use launch_control::LaunchControlState;
pub use level::LevelState;
pub use throttle_boost::ThrottleBoostState;
pub use thrust_linearization::ThrustLinearization;
