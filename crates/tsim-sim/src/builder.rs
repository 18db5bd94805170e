//! Fluent builder for constructing a [`Simulation`].

use tracing::info;

use tsim_core::{EventBuffer, EventSink, SimConfig};
use tsim_kernel::Scheduler;
use tsim_network::{Fleet, Network, Vehicle};
use tsim_strategy::{DispatchStrategy, VehicleFactory, VehicleStrategy};

use crate::dispatcher::DispatcherProcess;
use crate::vehicle::VehicleProcess;
use crate::{Dispatcher, SimError, SimResult, Simulation, StopHandle, World};

/// Fluent builder for [`Simulation<S>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: time bound, observe interval, edge fallback
/// - [`Network`] and [`Fleet`]: from the builders or the text loaders
/// - a boxed [`DispatchStrategy`]
/// - a factory producing one [`VehicleStrategy`] per vehicle
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                       |
/// |---------------------|-------------------------------|
/// | `.event_sink(s)`    | in-memory [`EventBuffer`]     |
/// | `.stop_handle(h)`   | a fresh, never-set handle     |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, network, fleet, dispatch, factory)
///     .event_sink(log)
///     .build()?;
/// let report = sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<S: EventSink> {
    config:   SimConfig,
    network:  Network,
    fleet:    Fleet,
    dispatch: Box<dyn DispatchStrategy>,
    factory:  VehicleFactory,
    sink:     S,
    stop:     StopHandle,
}

impl SimBuilder<EventBuffer> {
    /// Create a builder with all required inputs.
    pub fn new(
        config:   SimConfig,
        network:  Network,
        fleet:    Fleet,
        dispatch: Box<dyn DispatchStrategy>,
        factory:  impl Fn(&Vehicle) -> Box<dyn VehicleStrategy> + 'static,
    ) -> Self {
        Self {
            config,
            network,
            fleet,
            dispatch,
            factory: Box::new(factory),
            sink: EventBuffer::new(),
            stop: StopHandle::new(),
        }
    }
}

impl<S: EventSink> SimBuilder<S> {
    /// Send the event log to `sink` instead of an in-memory buffer.
    pub fn event_sink<T: EventSink>(self, sink: T) -> SimBuilder<T> {
        SimBuilder {
            config:   self.config,
            network:  self.network,
            fleet:    self.fleet,
            dispatch: self.dispatch,
            factory:  self.factory,
            sink,
            stop:     self.stop,
        }
    }

    /// Share a stop flag with the host.
    pub fn stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Validate inputs, assign routes, create guards and latches, spawn every
    /// process, and return a ready-to-run [`Simulation`].
    pub fn build(self) -> SimResult<Simulation<S>> {
        let SimBuilder { config, network, mut fleet, mut dispatch, factory, sink, stop } = self;

        // ── Validate configuration ────────────────────────────────────────
        if !config.observe_interval.is_finite() || config.observe_interval <= 0.0 {
            return Err(SimError::Config(format!(
                "observe_interval must be positive, got {}",
                config.observe_interval
            )));
        }
        if let Some(until) = config.until {
            if !until.is_finite() || until < 0.0 {
                return Err(SimError::Config(format!("until must be a non-negative number, got {until}")));
            }
        }

        // ── Route assignment, exactly once ────────────────────────────────
        dispatch.assign_route(&network, &mut fleet)?;
        if let Some(vehicle) = fleet.unassigned().next() {
            return Err(SimError::Unassigned { vehicle });
        }
        for vehicle in &fleet {
            if !vehicle.departure.is_finite() || vehicle.departure < 0.0 {
                return Err(SimError::Config(format!(
                    "vehicle {} was given departure {}",
                    vehicle.id, vehicle.departure
                )));
            }
        }

        check_edge_room(&network, &fleet)?;

        // ── Kernel objects ────────────────────────────────────────────────
        let mut scheduler: Scheduler<World<S>, SimError> = Scheduler::new();
        let life = scheduler.new_latch();
        let go = scheduler.new_latch();
        let node_guards = network
            .nodes()
            .iter()
            .map(|n| scheduler.new_guard(n.boarding_capacity.map(f64::from)))
            .collect();
        let edge_guards = network.edges().iter().map(|e| scheduler.new_guard(Some(e.capacity))).collect();

        // Vehicles first, so at t = 0 they are already parked on `go` when
        // the dispatcher fires it.
        for vehicle in &fleet {
            scheduler.spawn(Box::new(VehicleProcess::new(vehicle.id, go, factory(vehicle))));
        }
        scheduler.spawn(Box::new(DispatcherProcess::new()));

        info!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            routes = network.route_count(),
            vehicles = fleet.len(),
            demand = network.total_demand(),
            dispatch = dispatch.name(),
            "simulation built"
        );

        let initial_demand = network.total_demand();
        let dispatcher = Dispatcher::new(dispatch, fleet.len(), life, go);
        let world = World {
            network,
            fleet,
            dispatcher,
            sink,
            node_guards,
            edge_guards,
            stop,
            observe_interval: config.observe_interval,
            reverse_edge_fallback: config.reverse_edge_fallback,
        };
        Ok(Simulation::new(config, scheduler, world, initial_demand))
    }
}

/// Reject a vehicle longer than any edge of its route, in either direction.
fn check_edge_room(network: &Network, fleet: &Fleet) -> SimResult<()> {
    for vehicle in fleet {
        let Some(route) = vehicle.route else { continue };
        for pair in network.route(route)?.nodes().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let edges = [network.edge_between(a, b), network.edge_between(b, a)];
            if let Some(edge) = edges.into_iter().flatten().find(|e| e.capacity < vehicle.length) {
                return Err(SimError::Config(format!(
                    "vehicle {} of length {} never fits on edge {},{} of capacity {}",
                    vehicle.id, vehicle.length, edge.from, edge.to, edge.capacity
                )));
            }
        }
    }
    Ok(())
}
