//! The `Simulation` struct and its run loop.

use tracing::info;

use tsim_core::{EventSink, GuardId, SimConfig, SimTime};
use tsim_kernel::{CapacityGuard, Scheduler};

use crate::{SimError, SimObserver, SimResult, World};

// ── RunReport ─────────────────────────────────────────────────────────────────

/// Summary returned by [`Simulation::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Clock value when the run stopped.
    pub end_time: SimTime,
    /// Process resumptions performed by this call.
    pub steps: u64,
    /// `true` if the run hit `SimConfig::until` with work still pending.
    pub truncated: bool,
    /// Completed trips per vehicle, indexed by `VehicleId`.
    pub trips: Vec<u32>,
    /// Vehicle processes that had not finished.
    pub active_vehicles: usize,
    /// Total demand when the simulation was built.
    pub initial_demand: u64,
    /// Demand still waiting at the nodes.
    pub remaining_demand: u64,
    /// Passengers moved from node pools onto vehicles.
    pub drained: u64,
    /// Passengers still on board.
    pub onboard: u64,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// One configured run: the scheduler plus the world its processes share.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Simulation<S> {
    config:         SimConfig,
    scheduler:      Scheduler<World<S>, SimError>,
    world:          World<S>,
    initial_demand: u64,
    started:        bool,
}

impl<S: EventSink> Simulation<S> {
    pub(crate) fn new(
        config:         SimConfig,
        scheduler:      Scheduler<World<S>, SimError>,
        world:          World<S>,
        initial_demand: u64,
    ) -> Self {
        Self { config, scheduler, world, initial_demand, started: false }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run until every process has finished or the clock reaches
    /// `config.until`.
    ///
    /// The first call fires the dispatcher's life latch at the current time.
    /// Calling `run` again after a truncated run continues where it stopped.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunReport> {
        if !self.started {
            self.started = true;
            info!(until = ?self.config.until, "run start");
            self.scheduler.fire(self.world.dispatcher.life())?;
        }

        let until = self.config.end_time();
        let mut steps = 0u64;
        let mut truncated = false;
        let mut last = self.scheduler.now();
        while let Some(next) = self.scheduler.peek_time() {
            if until.is_some_and(|bound| next >= bound) {
                truncated = true;
                break;
            }
            if next > last {
                observer.on_time_advance(next, &self.world.network, &self.world.fleet);
                last = next;
            }
            self.scheduler.step(&mut self.world)?;
            steps += 1;
        }

        let end_time = match until {
            Some(bound) if truncated => bound,
            _ => self.scheduler.now(),
        };
        let report = self.report(end_time, steps, truncated);
        info!(
            end_time = report.end_time.0,
            steps = report.steps,
            truncated = report.truncated,
            remaining = report.remaining_demand,
            drained = report.drained,
            "run end"
        );
        observer.on_sim_end(&report);
        Ok(report)
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn world(&self) -> &World<S> {
        &self.world
    }

    pub fn sink(&self) -> &S {
        &self.world.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.world.sink
    }

    /// Consume the simulation and return its event sink.
    pub fn into_sink(self) -> S {
        self.world.sink
    }

    /// The guard protecting edge occupancy or node boarding, for inspection.
    pub fn guard(&self, id: GuardId) -> Option<&CapacityGuard> {
        self.scheduler.guard(id)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn report(&self, end_time: SimTime, steps: u64, truncated: bool) -> RunReport {
        let fleet = &self.world.fleet;
        let network = &self.world.network;
        RunReport {
            end_time,
            steps,
            truncated,
            trips: fleet.iter().map(|v| v.trip_count()).collect(),
            active_vehicles: self.world.dispatcher.active_vehicles(),
            initial_demand: self.initial_demand,
            remaining_demand: network.total_demand(),
            drained: network.total_drained(),
            onboard: fleet.iter().map(|v| u64::from(v.onboard())).sum(),
        }
    }
}
