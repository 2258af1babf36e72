//! Error types for the control core.
//!
//! There are no recoverable errors inside the hot loop: numeric defects are
//! sanitized and counted as [`RtFault`]s rather than propagated. Fallible
//! operations exist only at initialization and profile-apply time.

use thiserror::Error;

/// Errors raised while deriving a runtime from a profile.
#[derive(Error, Debug)]
pub enum PidInitError {
    /// Gyro rate or process denominator produce an unusable loop period.
    #[error("Invalid loop rate: gyro {gyro_rate_hz} Hz / denom {denom}")]
    InvalidLoopRate {
        /// Gyro sampling rate handed in by the scheduler.
        gyro_rate_hz: f32,
        /// PID process denominator from the loop configuration.
        denom: u8,
    },

    /// The profile failed validation.
    #[error(transparent)]
    InvalidProfile(#[from] openflight_profile::ProfileError),
}

/// Hot-path fault codes (pre-allocated for RT-safe reporting).
///
/// These are RT-safe by construction:
/// - `Copy` semantics ensure no heap allocations
/// - Fixed `#[repr(u8)]` representation
/// - Pre-defined codes for fast classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RtFault {
    /// A gyro/setpoint/throttle input was NaN or infinite; the sample was
    /// replaced with zero for the tick.
    InputNotFinite = 1,
    /// An axis sum came out non-finite; the output was forced to zero.
    OutputNotFinite = 2,
}

impl RtFault {
    /// Get the numeric fault code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Create a fault from a code.
    ///
    /// Returns `None` if the code does not correspond to a known fault.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RtFault::InputNotFinite),
            2 => Some(RtFault::OutputNotFinite),
            _ => None,
        }
    }
}

impl core::fmt::Display for RtFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RtFault::InputNotFinite => write!(f, "Non-finite control input"),
            RtFault::OutputNotFinite => write!(f, "Non-finite axis output"),
        }
    }
}

impl std::error::Error for RtFault {}

/// Saturating per-fault counters, readable between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RtFaultCounters {
    /// Count of [`RtFault::InputNotFinite`] events.
    pub input_not_finite: u32,
    /// Count of [`RtFault::OutputNotFinite`] events.
    pub output_not_finite: u32,
}

impl RtFaultCounters {
    /// Record a fault.
    #[inline]
    pub fn record(&mut self, fault: RtFault) {
        let counter = match fault {
            RtFault::InputNotFinite => &mut self.input_not_finite,
            RtFault::OutputNotFinite => &mut self.output_not_finite,
        };
        *counter = counter.saturating_add(1);
    }

    /// True when no fault has been recorded.
    pub fn is_clean(&self) -> bool {
        self.input_not_finite == 0 && self.output_not_finite == 0
    }
}
