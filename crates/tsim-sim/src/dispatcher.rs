//! The dispatcher: owns the dispatch strategy, the per-vehicle flags, and
//! the two start-up latches.
//!
//! ```text
//! Simulation::run ──fire──▶ life ──▶ DispatcherProcess ──fire──▶ go ──▶ every VehicleProcess
//!                                         │
//!                                         └─ every observe_interval: strategy.observe(flags, now)
//!
//! VehicleProcess (trip done) ──▶ notify ──▶ update_route ──▶ RouteDecision
//! ```
//!
//! Vehicle processes call [`Dispatcher::notify`] and
//! [`Dispatcher::update_route`] synchronously from inside their own
//! resumption, so the flag arrays are only ever touched by one process at a
//! time.

use tracing::{debug, info};

use tsim_core::{LatchId, SimTime, VehicleId};
use tsim_kernel::{Context, Process, Yield};
use tsim_network::{Network, Vehicle};
use tsim_strategy::{DispatchFlags, DispatchStrategy, RouteDecision};

use crate::{SimError, SimResult, World};

// ── Dispatcher ────────────────────────────────────────────────────────────────

pub struct Dispatcher {
    strategy: Box<dyn DispatchStrategy>,
    flags:    DispatchFlags,
    life:     LatchId,
    go:       LatchId,
    /// Vehicle processes that have not finished.
    active:   usize,
}

impl Dispatcher {
    pub(crate) fn new(strategy: Box<dyn DispatchStrategy>, vehicles: usize, life: LatchId, go: LatchId) -> Self {
        Self { strategy, flags: DispatchFlags::new(vehicles), life, go, active: vehicles }
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn flags(&self) -> &DispatchFlags {
        &self.flags
    }

    /// Fired once by the host to start the dispatcher.
    pub fn life(&self) -> LatchId {
        self.life
    }

    /// Fired once by the dispatcher to release every vehicle.
    pub fn go(&self) -> LatchId {
        self.go
    }

    pub fn active_vehicles(&self) -> usize {
        self.active
    }

    /// Record that `vehicle` has finished a trip.
    pub fn notify(&mut self, vehicle: VehicleId) {
        let i = vehicle.index();
        self.flags.dispatch[i] = false;
        self.flags.completion[i] = true;
    }

    /// Ask the strategy what `vehicle` does after the trip it just reported.
    ///
    /// Consumes the completion flag and re-raises the dispatch flag if the
    /// vehicle runs again.
    pub fn update_route(&mut self, network: &Network, vehicle: &mut Vehicle) -> RouteDecision {
        let before = vehicle.route;
        let decision = self.strategy.update_route(network, vehicle, &self.flags);
        let i = vehicle.id.index();
        self.flags.completion[i] = false;
        self.flags.dispatch[i] = decision.will_repeat;
        debug!(
            vehicle = vehicle.id.0,
            from = ?before.map(|r| r.0),
            to = ?vehicle.route.map(|r| r.0),
            transfer = decision.will_transfer,
            repeat = decision.will_repeat,
            "route decision"
        );
        decision
    }

    /// A vehicle process has finished for good.
    pub(crate) fn retire(&mut self, vehicle: VehicleId) {
        self.active = self.active.saturating_sub(1);
        if let Some(flag) = self.flags.dispatch.get_mut(vehicle.index()) {
            *flag = false;
        }
        debug!(vehicle = vehicle.0, active = self.active, "vehicle retired");
    }

    fn release_all(&mut self) {
        self.flags.dispatch.iter_mut().for_each(|f| *f = true);
    }

    fn observe(&mut self, now: SimTime) {
        self.strategy.observe(&self.flags, now);
    }
}

// ── DispatcherProcess ─────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    AwaitLife,
    Release,
    Observe,
}

/// Waits for the life latch, fires go, then ticks the strategy's `observe`
/// hook until every vehicle process has finished.
pub(crate) struct DispatcherProcess {
    phase: Phase,
}

impl DispatcherProcess {
    pub(crate) fn new() -> Self {
        Self { phase: Phase::AwaitLife }
    }
}

impl<S> Process<World<S>, SimError> for DispatcherProcess {
    fn resume(&mut self, world: &mut World<S>, cx: &mut Context<'_>) -> SimResult<Yield> {
        loop {
            match self.phase {
                Phase::AwaitLife => {
                    self.phase = Phase::Release;
                    return Ok(Yield::Latch(world.dispatcher.life));
                }
                Phase::Release => {
                    info!(
                        strategy = world.dispatcher.strategy_name(),
                        vehicles = world.dispatcher.active,
                        at = cx.now().0,
                        "dispatcher life begins"
                    );
                    world.dispatcher.release_all();
                    cx.fire(world.dispatcher.go)?;
                    self.phase = Phase::Observe;
                }
                Phase::Observe => {
                    if world.dispatcher.active == 0 {
                        info!(at = cx.now().0, "every vehicle has finished");
                        return Ok(Yield::Done);
                    }
                    world.dispatcher.observe(cx.now());
                    return Ok(Yield::Timeout(world.observe_interval));
                }
            }
        }
    }

    fn label(&self) -> String {
        String::from("dispatcher")
    }
}
