//! The per-vehicle trip state machine.
//!
//! ```text
//!            go            departure
//! AwaitGo ───────▶ Depart ───────────▶ TripStart ─▶ Query(Forward) ─┐
//!                                          ▲                         │
//!                                          │        ┌────────────────┘
//!                                          │        ▼
//!                                          │   Query(pass) ──stop──▶ Board ──┐
//!                                          │        │                        │
//!                                          │        ▼◀───────────────────────┘
//!                                          │      Move ──continue──▶ Enter ─▶ Leave ─▶ Query(pass)
//!                                          │        │
//!                                          │        ▼
//!                                          │   PassEnd(pass)
//!                                          │        │ Forward  → Query(Backward)
//!                                          │        │ Backward → notify, update_route
//!                                          └────────┤   repeat   → plan_trip → TripStart
//!                                                   │   transfer → Query(Transfer) → plan_trip → TripStart
//!                                                   │   retire   → Done
//! ```
//!
//! Suspension points: the go latch, the departure delay, the node guard
//! (one slot per boarding vehicle), the edge guard (vehicle length), the
//! traversal time, and each step's wait.

use tracing::{debug, trace, warn};

use tsim_core::{EdgeId, Event, EventSink, LatchId, NodeId, PassKind, RouteId, SimTime, VehicleId};
use tsim_kernel::{Context, Process, Yield};
use tsim_strategy::{Step, TripView, VehicleStrategy};

use crate::world::{node_of, route_of};
use crate::{SimError, SimResult, World};

/// Node guard units taken by one boarding vehicle.
const BOARDING_SLOT: f64 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    AwaitGo,
    Depart,
    TripStart,
    Query(PassKind),
    Board(PassKind, Step),
    Move(PassKind, Step),
    Enter(PassKind, Step, EdgeId),
    Leave(PassKind, Step, EdgeId),
    PassEnd(PassKind),
    /// Back off after a trip that took no time at all.
    Idle,
}

/// One fleet unit's process.  Owns the vehicle's [`VehicleStrategy`].
pub(crate) struct VehicleProcess {
    id:         VehicleId,
    go:         LatchId,
    strategy:   Box<dyn VehicleStrategy>,
    state:      State,
    /// When the current trip started.
    trip_began: SimTime,
}

impl VehicleProcess {
    pub(crate) fn new(id: VehicleId, go: LatchId, strategy: Box<dyn VehicleStrategy>) -> Self {
        Self { id, go, strategy, state: State::AwaitGo, trip_began: SimTime::ZERO }
    }

    fn plan<S>(&mut self, world: &World<S>) -> SimResult<()> {
        let vehicle = world.vehicle(self.id)?;
        let route = world.network.route(route_of(vehicle)?)?;
        self.strategy.plan_trip(&TripView { vehicle, route, network: &world.network });
        Ok(())
    }

    fn next_step<S>(&mut self, world: &World<S>, pass: PassKind) -> SimResult<Step> {
        let vehicle = world.vehicle(self.id)?;
        let route = world.network.route(route_of(vehicle)?)?;
        let view = TripView { vehicle, route, network: &world.network };
        Ok(match pass {
            PassKind::Forward => self.strategy.next_forward_node(&view),
            PassKind::Backward => self.strategy.next_backward_node(&view),
            PassKind::Transfer => self.strategy.next_transfer_node(&view),
        })
    }

    fn log<S: EventSink>(&self, world: &mut World<S>, event: impl FnOnce(RouteId) -> Event) -> SimResult<()> {
        let route = route_of(world.vehicle(self.id)?)?;
        world.sink.record(&event(route));
        Ok(())
    }

    /// Fill, then drain, at the vehicle's current node.
    fn board<S: EventSink>(&mut self, world: &mut World<S>, now: SimTime) -> SimResult<()> {
        let World { network, fleet, sink, .. } = world;
        let vehicle = fleet.get_mut(self.id).ok_or(SimError::UnknownVehicle(self.id))?;
        let here = node_of(vehicle)?;
        let mut desk = network.desk(here, route_of(vehicle)?, self.id, now, sink)?;
        let boarded = self.strategy.passenger_fill(vehicle, &mut desk);
        let alighted = self.strategy.passenger_drain(vehicle, &mut desk);
        assert!(vehicle.onboard() <= vehicle.capacity, "vehicle {} over capacity", self.id);
        trace!(vehicle = self.id.0, node = here.0, boarded, alighted, onboard = vehicle.onboard(), "stop");
        Ok(())
    }

    /// Choose the edge towards `step.next_node` and ask for room on it.
    fn depart_towards<S>(&self, world: &World<S>, pass: PassKind, step: Step) -> SimResult<(EdgeId, f64)> {
        let vehicle = world.vehicle(self.id)?;
        let here = node_of(vehicle)?;
        let next = step
            .next_node
            .ok_or_else(|| self.protocol(format!("{pass} step continues from {here} without a next node")))?;
        let allow_reverse = world.reverse_edge_fallback && pass != PassKind::Forward;
        let edge = world.network.resolve_edge(here, next, allow_reverse)?;
        if edge.from != here {
            warn!(vehicle = self.id.0, from = here.0, to = next.0, "no directed edge, using the reverse edge");
        }
        Ok((edge.id, vehicle.length))
    }

    /// Log the pass end and pick the next state.  `None` means the vehicle
    /// is finished.
    fn end_pass<S: EventSink>(&mut self, world: &mut World<S>, pass: PassKind, now: SimTime) -> SimResult<Option<State>> {
        self.log(world, |route| Event::PassCompletion { route, vehicle: self.id, pass, at: now })?;
        match pass {
            PassKind::Forward => Ok(Some(State::Query(PassKind::Backward))),
            PassKind::Backward => {
                world.dispatcher.notify(self.id);
                let World { network, fleet, dispatcher, sink, .. } = world;
                let vehicle = fleet.get_mut(self.id).ok_or(SimError::UnknownVehicle(self.id))?;
                let trip = vehicle.complete_trip();
                sink.record(&Event::TripCompletion { route: route_of(vehicle)?, vehicle: self.id, trip, at: now });
                let decision = dispatcher.update_route(network, vehicle);
                match (decision.will_repeat, decision.will_transfer) {
                    (false, _) => Ok(None),
                    (true, true) => Ok(Some(State::Query(PassKind::Transfer))),
                    (true, false) => {
                        self.plan(world)?;
                        // A trip with no travel and no waits would repeat
                        // forever without the clock moving.
                        Ok(Some(if now <= self.trip_began { State::Idle } else { State::TripStart }))
                    }
                }
            }
            PassKind::Transfer => {
                let vehicle = world.vehicle(self.id)?;
                let at = node_of(vehicle)?;
                let start = world.network.route(route_of(vehicle)?)?.first();
                if at != start {
                    return Err(SimError::TransferIncomplete { vehicle: self.id, at, start });
                }
                self.plan(world)?;
                Ok(Some(State::TripStart))
            }
        }
    }

    /// The leg being driven: from the current node to the step's target.
    fn leg<S>(&self, world: &World<S>, step: Step) -> SimResult<(NodeId, NodeId)> {
        let here = node_of(world.vehicle(self.id)?)?;
        let next = step.next_node.ok_or_else(|| self.protocol(format!("moving from {here} without a target")))?;
        Ok((here, next))
    }

    fn protocol(&self, msg: String) -> SimError {
        SimError::Protocol { vehicle: self.id, msg }
    }

    fn finish<S>(&self, world: &mut World<S>) -> Yield {
        world.dispatcher.retire(self.id);
        Yield::Done
    }
}

impl<S: EventSink> Process<World<S>, SimError> for VehicleProcess {
    fn resume(&mut self, world: &mut World<S>, cx: &mut Context<'_>) -> SimResult<Yield> {
        let now = cx.now();
        loop {
            match self.state {
                State::AwaitGo => {
                    self.state = State::Depart;
                    return Ok(Yield::Latch(self.go));
                }
                State::Depart => {
                    self.plan(world)?;
                    self.state = State::TripStart;
                    return Ok(Yield::Timeout(world.vehicle(self.id)?.departure));
                }
                State::TripStart => {
                    if world.stop.is_stop_requested() {
                        debug!(vehicle = self.id.0, at = now.0, "stop requested");
                        return Ok(self.finish(world));
                    }
                    let trip = world.vehicle(self.id)?.trip_count();
                    self.log(world, |route| Event::TripStart { route, vehicle: self.id, trip, at: now })?;
                    self.trip_began = now;
                    self.state = State::Query(PassKind::Forward);
                }
                State::Query(pass) => {
                    let step = self.next_step(world, pass)?;
                    if step.should_stop && pass != PassKind::Transfer {
                        let here = node_of(world.vehicle(self.id)?)?;
                        let guard = world
                            .node_guard(here)
                            .ok_or_else(|| self.protocol(format!("no boarding guard for {here}")))?;
                        self.state = State::Board(pass, step);
                        return Ok(Yield::Acquire { guard, amount: BOARDING_SLOT });
                    }
                    self.state = State::Move(pass, step);
                }
                State::Board(pass, step) => {
                    self.board(world, now)?;
                    let here = node_of(world.vehicle(self.id)?)?;
                    if let Some(guard) = world.node_guard(here) {
                        cx.release(guard, BOARDING_SLOT)?;
                    }
                    self.state = State::Move(pass, step);
                }
                State::Move(pass, step) => {
                    if !step.should_continue {
                        self.state = State::PassEnd(pass);
                        return Ok(Yield::Timeout(step.wait_time));
                    }
                    let (edge, amount) = self.depart_towards(world, pass, step)?;
                    let guard = world.edge_guard(edge).ok_or_else(|| self.protocol(format!("no guard for {edge}")))?;
                    self.state = State::Enter(pass, step, edge);
                    return Ok(Yield::Acquire { guard, amount });
                }
                State::Enter(pass, step, edge) => {
                    let (from, to) = self.leg(world, step)?;
                    let e = world.network.edge(edge).ok_or_else(|| self.protocol(format!("unknown {edge}")))?;
                    let length = e.length;
                    let traverse = self.strategy.traverse_time(world.vehicle(self.id)?, e);
                    self.log(world, |route| Event::Entering { route, vehicle: self.id, from, to, length, at: now })?;
                    self.state = State::Leave(pass, step, edge);
                    return Ok(Yield::Timeout(traverse));
                }
                State::Leave(pass, step, edge) => {
                    let (from, to) = self.leg(world, step)?;
                    let length = world.network.edge(edge).map_or(0.0, |e| e.length);
                    let amount = world.vehicle(self.id)?.length;
                    if let Some(guard) = world.edge_guard(edge) {
                        cx.release(guard, amount)?;
                    }
                    self.log(world, |route| Event::Leaving { route, vehicle: self.id, from, to, length, at: now })?;
                    let vehicle = world.fleet.get_mut(self.id).ok_or(SimError::UnknownVehicle(self.id))?;
                    vehicle.current_node = Some(to);
                    self.state = State::Query(pass);
                    return Ok(Yield::Timeout(step.wait_time));
                }
                State::Idle => {
                    debug!(vehicle = self.id.0, at = now.0, "zero-length trip, idling");
                    self.state = State::TripStart;
                    return Ok(Yield::Timeout(world.observe_interval));
                }
                State::PassEnd(pass) => match self.end_pass(world, pass, now)? {
                    Some(next) => self.state = next,
                    None => return Ok(self.finish(world)),
                },
            }
        }
    }

    fn label(&self) -> String {
        format!("vehicle {}", self.id.0)
    }
}
