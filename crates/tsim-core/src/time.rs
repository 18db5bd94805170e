//! Virtual time model.
//!
//! # Design
//!
//! Time is a dimensionless, monotonically non-decreasing `f64` held in
//! [`SimTime`].  Edge traversal durations are `length / speed`, so integer
//! ticks would force rounding into every trip; a float clock keeps the
//! arithmetic faithful to the inputs.
//!
//! `f64` is not `Ord`, so `SimTime` orders by [`f64::total_cmp`].  The
//! scheduler rejects NaN and negative delays, which keeps that ordering
//! identical to numeric ordering for every value that can reach the queue.

use std::cmp::Ordering;
use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// A point on the virtual clock.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Return the time `delay` units after `self`.
    #[inline]
    pub fn after(self, delay: f64) -> SimTime {
        SimTime(self.0 + delay)
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl From<f64> for SimTime {
    fn from(t: f64) -> Self {
        SimTime(t)
    }
}

/// Prints the bare number (`10`, `1.5`) so event log lines stay parseable.
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run-level simulation configuration.
///
/// Typically loaded from a JSON file by the host binary and passed to the
/// simulation builder.  Strategy tuning, including the rerouting seed, lives
/// separately in `tsim_strategy::StrategyConfig`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// External time bound.  `None` runs until no process is runnable.
    pub until: Option<f64>,

    /// Period of the dispatcher's observation tick.  Default: 1.0.
    pub observe_interval: f64,

    /// When a backward or transfer step has no directed edge, traverse the
    /// reverse edge instead of failing.  Default: `true`.
    pub reverse_edge_fallback: bool,
}

impl SimConfig {
    /// The bound as a `SimTime`, if any.
    #[inline]
    pub fn end_time(&self) -> Option<SimTime> {
        self.until.map(SimTime)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            until:                 None,
            observe_interval:      1.0,
            reverse_edge_fallback: true,
        }
    }
}
