//! Simulation observer trait for progress reporting.

use tsim_core::SimTime;
use tsim_network::{Fleet, Network};

use crate::RunReport;

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress { every: f64, next: f64 }
///
/// impl SimObserver for Progress {
///     fn on_time_advance(&mut self, now: SimTime, network: &Network, _: &Fleet) {
///         if now.0 >= self.next {
///             println!("t={now}: {} still waiting", network.total_demand());
///             self.next += self.every;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called whenever the clock is about to move forward, before the first
    /// process runs at the new time.
    fn on_time_advance(&mut self, _now: SimTime, _network: &Network, _fleet: &Fleet) {}

    /// Called once when `run` returns successfully.
    fn on_sim_end(&mut self, _report: &RunReport) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
