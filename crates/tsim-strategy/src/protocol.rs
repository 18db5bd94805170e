//! The strategy protocol: the extension boundary between the simulation and
//! routing/boarding policy.
//!
//! Two capability traits are selected once per run:
//!
//! - [`DispatchStrategy`] assigns every vehicle a route before the run and
//!   decides, after each completed trip, whether the vehicle transfers to a
//!   new route and whether it runs again.
//! - [`VehicleStrategy`] (one instance per vehicle) plans each trip, answers
//!   "where next?" one [`Step`] at a time for each pass, and decides who
//!   boards at a stop.
//!
//! Strategies never touch time, guards, or the event log directly.  The
//! vehicle process turns their answers into guard acquisitions, edge
//! traversals, and waits.

use tsim_core::{NodeId, SimTime, VehicleId};
use tsim_network::{BoardingDesk, Edge, Fleet, Network, Route, Vehicle};

use crate::StrategyResult;

// ── Step ──────────────────────────────────────────────────────────────────────

/// One answer to "what now?" during a pass.
///
/// `should_stop` refers to the node the vehicle is at *now*: board and
/// unload here before leaving.  If `should_continue`, the vehicle then
/// traverses the edge to `next_node`.  Either way it then waits `wait_time`.
/// The pass ends after the first step with `should_continue == false`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Step {
    pub next_node:       Option<NodeId>,
    pub should_stop:     bool,
    pub should_continue: bool,
    pub wait_time:       f64,
}

impl Step {
    /// Stop here if `stop`, then move on to `next`.
    pub fn advance(next: NodeId, stop: bool, wait_time: f64) -> Self {
        Self { next_node: Some(next), should_stop: stop, should_continue: true, wait_time }
    }

    /// Stop here if `stop`; this is the last step of the pass.
    pub fn finish(stop: bool, wait_time: f64) -> Self {
        Self { next_node: None, should_stop: stop, should_continue: false, wait_time }
    }
}

// ── TripView ──────────────────────────────────────────────────────────────────

/// Read-only view handed to a vehicle strategy when it plans or steps.
#[derive(Copy, Clone)]
pub struct TripView<'a> {
    pub vehicle: &'a Vehicle,
    pub route:   &'a Route,
    pub network: &'a Network,
}

impl TripView<'_> {
    /// The vehicle's current node, or the route start if it has none yet.
    pub fn current_node(&self) -> NodeId {
        self.vehicle.current_node.unwrap_or_else(|| self.route.first())
    }
}

// ── Dispatch flags and decisions ──────────────────────────────────────────────

/// Per-vehicle flags kept by the dispatcher, indexed by `VehicleId`.
///
/// `completion[v]` is raised when vehicle `v` finishes a trip and lowered
/// once that trip's rerouting decision has been made.  `dispatch[v]` is
/// raised while `v` is cleared to run another trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchFlags {
    pub completion: Vec<bool>,
    pub dispatch:   Vec<bool>,
}

impl DispatchFlags {
    pub fn new(vehicles: usize) -> Self {
        Self { completion: vec![false; vehicles], dispatch: vec![false; vehicles] }
    }

    pub fn any_completed(&self) -> bool {
        self.completion.iter().any(|&c| c)
    }

    /// Vehicles whose completion has not yet been consumed.
    pub fn completed(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.completion
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(|(i, _)| VehicleId(i as u32))
    }
}

/// The dispatcher's answer after a completed trip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RouteDecision {
    /// Relocate to the start of the (newly assigned) route before the next trip.
    pub will_transfer: bool,
    /// Run another trip.
    pub will_repeat:   bool,
}

impl RouteDecision {
    /// Same route, run again.
    pub const REPEAT: RouteDecision = RouteDecision { will_transfer: false, will_repeat: true };
    /// New route, transfer, then run again.
    pub const TRANSFER: RouteDecision = RouteDecision { will_transfer: true, will_repeat: true };
    /// Stop.
    pub const RETIRE: RouteDecision = RouteDecision { will_transfer: false, will_repeat: false };
}

// ── DispatchStrategy ──────────────────────────────────────────────────────────

/// Route assignment and rerouting policy.
pub trait DispatchStrategy {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Called exactly once before any vehicle moves.
    ///
    /// Must set `route` and `current_node` on every vehicle; may also set
    /// `departure`.  Vehicles left unassigned abort the run.
    fn assign_route(&mut self, network: &Network, fleet: &mut Fleet) -> StrategyResult<()>;

    /// Periodic tick for bookkeeping that depends on the completion flags.
    ///
    /// Default: does nothing.
    fn observe(&mut self, _flags: &DispatchFlags, _now: SimTime) {}

    /// Called synchronously when `vehicle` completes a trip.
    ///
    /// May change `vehicle.route`; if it does, it should ask for a transfer.
    fn update_route(
        &mut self,
        network: &Network,
        vehicle: &mut Vehicle,
        flags:   &DispatchFlags,
    ) -> RouteDecision;
}

// ── VehicleStrategy ───────────────────────────────────────────────────────────

/// Per-vehicle navigation and boarding policy.
///
/// One instance is created per vehicle, so implementations may keep pass
/// cursors and planned node lists as plain fields.
pub trait VehicleStrategy {
    /// Compute the node sequences for the vehicle's assigned route and reset
    /// pass cursors.  Called before the first trip and before every later
    /// trip, after any transfer.  The vehicle may be part-way along the route.
    fn plan_trip(&mut self, trip: &TripView<'_>);

    fn next_forward_node(&mut self, trip: &TripView<'_>) -> Step;

    /// Steps of the return leg.  The number of steps may differ from the
    /// forward pass and may change from trip to trip.
    fn next_backward_node(&mut self, trip: &TripView<'_>) -> Step;

    /// Steps that bring the vehicle to the start of a newly assigned route.
    /// Stops are ignored on this pass.
    ///
    /// Default: no movement.
    fn next_transfer_node(&mut self, _trip: &TripView<'_>) -> Step {
        Step::finish(false, 0.0)
    }

    /// Board passengers at the desk's node.  Returns the number boarded.
    fn passenger_fill(&mut self, vehicle: &mut Vehicle, desk: &mut BoardingDesk<'_>) -> u32;

    /// Unload passengers at the desk's node.  Returns the number unloaded.
    ///
    /// Default: everyone bound for this node gets off.
    fn passenger_drain(&mut self, vehicle: &mut Vehicle, desk: &mut BoardingDesk<'_>) -> u32 {
        desk.offload(vehicle)
    }

    /// Time to traverse `edge`.
    ///
    /// Default: `edge.length / vehicle.speed`.
    fn traverse_time(&self, vehicle: &Vehicle, edge: &Edge) -> f64 {
        edge.length / vehicle.speed
    }
}
