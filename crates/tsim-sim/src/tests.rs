//! Integration tests for tsim-sim.

use std::cell::Cell;
use std::rc::Rc;

use tsim_core::{EdgeId, Event, EventBuffer, NodeId, PassKind, RouteId, SimConfig, SimTime};
use tsim_network::{BoardingDesk, Fleet, FleetBuilder, Network, NetworkBuilder, Vehicle};
use tsim_strategy::{
    DispatchFlags, DispatchKind, DispatchStrategy, ExhaustedRoute, RouteDecision, StrategyConfig, StrategyResult,
    Step, TransitVehicle, TripView, VehicleKind, VehicleStrategy,
};

use crate::{NoopObserver, RunReport, SimBuilder, SimError, SimObserver, Simulation, StopHandle};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn n(i: u32) -> NodeId {
    NodeId(i)
}

fn config(until: Option<f64>) -> SimConfig {
    SimConfig { until, ..SimConfig::default() }
}

fn fleet(count: u32, capacity: u32, length: f64, speed: f64) -> Fleet {
    let mut b = FleetBuilder::new();
    b.add_class("bus", capacity, length, speed, count).unwrap();
    b.build()
}

fn retiring() -> StrategyConfig {
    StrategyConfig { exhausted_route: ExhaustedRoute::Retire, ..StrategyConfig::default() }
}

fn transit(dwell: f64) -> impl Fn(&Vehicle) -> Box<dyn VehicleStrategy> + 'static {
    move |_| Box::new(TransitVehicle::new(dwell))
}

fn lines(sim: &Simulation<EventBuffer>) -> Vec<String> {
    sim.sink().lines()
}

/// Scenario A: 0 → 1, length 100, capacity 1, demand[0→1] = 5.
fn scenario_a() -> Network {
    let mut b = NetworkBuilder::new();
    b.add_nodes(2, None);
    b.add_edge(n(0), n(1), 100.0, 1.0);
    b.set_demand(n(0), n(1), 5);
    b.add_route(vec![n(0), n(1)]);
    b.build().unwrap()
}

/// 0 ↔ 1 ↔ 2 ↔ 3 with the shelter at 3.
fn evacuation_line() -> Network {
    let mut b = NetworkBuilder::new();
    b.add_nodes(4, None);
    for i in 1..4 {
        b.add_road(n(i - 1), n(i), 100.0, 100.0);
    }
    b.set_demand(n(0), n(3), 30);
    b.set_demand(n(2), n(3), 10);
    b.add_route(vec![n(0), n(1), n(2), n(3)]);
    b.build().unwrap()
}

fn evacuation_sim() -> Simulation<EventBuffer> {
    let cfg = retiring();
    let dispatch = DispatchKind::DemandProportional.build(&cfg).unwrap();
    let factory = VehicleKind::Evacuation.factory(&cfg).unwrap();
    SimBuilder::new(config(None), evacuation_line(), fleet(2, 10, 10.0, 10.0), dispatch, factory)
        .build()
        .unwrap()
}

// ── Single-vehicle trips ──────────────────────────────────────────────────────

#[cfg(test)]
mod trip {
    use super::*;

    #[test]
    fn scenario_a_boards_traverses_and_offloads() {
        let dispatch = DispatchKind::DemandProportional.build(&retiring()).unwrap();
        let mut sim = SimBuilder::new(config(None), scenario_a(), fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();

        assert_eq!(lines(&sim), vec![
            "route 0 vehicle 0 trip_start 0 at 0",
            "route 0 vehicle 0 boarding 5 passenger for 1 from 0 at 0",
            "route 0 vehicle 0 entering edge 0,1 of length 100 at 0",
            "route 0 vehicle 0 leaving edge 0,1 of length 100 at 10",
            "route 0 vehicle 0 offloading 5 passenger for 1 at 10",
            "route 0 vehicle 0 forward_pass_completion at 10",
            "route 0 vehicle 0 entering edge 1,0 of length 100 at 10",
            "route 0 vehicle 0 leaving edge 1,0 of length 100 at 20",
            "route 0 vehicle 0 backward_pass_completion at 20",
            "route 0 vehicle 0 trip_completion 1 at 20",
        ]);
        assert_eq!(sim.world().network.demand_to(n(0), n(1)), 0);
        assert!(!report.truncated);
        assert_eq!(report.trips, vec![1]);
        assert_eq!(report.active_vehicles, 0);
        assert_eq!((report.initial_demand, report.remaining_demand, report.drained), (5, 0, 5));
    }

    #[test]
    fn every_repeated_trip_is_planned() {
        struct Counting {
            inner: TransitVehicle,
            plans: Rc<Cell<u32>>,
        }

        impl VehicleStrategy for Counting {
            fn plan_trip(&mut self, trip: &TripView<'_>) {
                self.plans.set(self.plans.get() + 1);
                self.inner.plan_trip(trip);
            }

            fn next_forward_node(&mut self, trip: &TripView<'_>) -> Step {
                self.inner.next_forward_node(trip)
            }

            fn next_backward_node(&mut self, trip: &TripView<'_>) -> Step {
                self.inner.next_backward_node(trip)
            }

            fn passenger_fill(&mut self, vehicle: &mut Vehicle, desk: &mut BoardingDesk<'_>) -> u32 {
                self.inner.passenger_fill(vehicle, desk)
            }
        }

        let plans = Rc::new(Cell::new(0));
        let shared = Rc::clone(&plans);
        let factory = move |_: &Vehicle| -> Box<dyn VehicleStrategy> {
            Box::new(Counting { inner: TransitVehicle::new(0.0), plans: Rc::clone(&shared) })
        };
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let mut sim = SimBuilder::new(config(Some(65.0)), scenario_a(), fleet(1, 10, 1.0, 10.0), dispatch, factory)
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();

        assert_eq!(report.trips, vec![3]);
        // One plan before the first trip, one before each repeat.
        assert_eq!(plans.get(), 4);
    }

    #[test]
    fn no_reverse_fallback_is_an_error() {
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let cfg = SimConfig { reverse_edge_fallback: false, ..config(Some(100.0)) };
        let mut sim = SimBuilder::new(cfg, scenario_a(), fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        let err = sim.run(&mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::Network(_)));
    }

    #[test]
    fn time_bound_truncates() {
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let mut sim = SimBuilder::new(config(Some(25.0)), scenario_a(), fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();
        assert!(report.truncated);
        assert_eq!(report.end_time, SimTime(25.0));
        assert_eq!(report.trips, vec![1]);
        assert_eq!(report.active_vehicles, 1);
        // The second trip has started but its first edge is still occupied.
        let last = sim.sink().events().last().cloned().unwrap();
        assert_eq!((last.tag(), last.at()), ("entering", SimTime(20.0)), "{last}");
    }

    #[test]
    fn zero_length_trips_advance_the_clock() {
        let mut b = NetworkBuilder::new();
        b.add_node(None);
        b.add_route(vec![n(0)]);
        let net = b.build().unwrap();
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let mut sim = SimBuilder::new(config(Some(5.0)), net, fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(report.trips, vec![5]);
        assert!(sim.sink().events().iter().all(|e| !matches!(e, Event::Entering { .. })));
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod contention {
    use super::*;

    fn shared_edge() -> Network {
        let mut b = NetworkBuilder::new();
        b.add_nodes(2, None);
        b.add_road(n(0), n(1), 100.0, 100.0);
        b.add_route(vec![n(0), n(1)]);
        b.build().unwrap()
    }

    #[test]
    fn scenario_b_second_vehicle_waits_for_room() {
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let mut sim = SimBuilder::new(config(Some(15.0)), shared_edge(), fleet(2, 10, 60.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let events = sim.sink().events();
        let entered = |v: u32| {
            events
                .iter()
                .find_map(|e| match e {
                    Event::Entering { vehicle, at, .. } if vehicle.0 == v => Some(*at),
                    _ => None,
                })
                .unwrap()
        };
        let first_left = events
            .iter()
            .find_map(|e| match e {
                Event::Leaving { vehicle, at, .. } if vehicle.0 == 0 => Some(*at),
                _ => None,
            })
            .unwrap();
        assert_eq!(entered(0), SimTime(0.0));
        assert!(entered(1) >= first_left);
        assert_eq!(entered(1), SimTime(10.0));

        let guard = sim.world().edge_guard(EdgeId(0)).unwrap();
        let guard = sim.guard(guard).unwrap();
        assert_eq!(guard.peak_occupancy(), 60.0);
        assert!(guard.peak_occupancy() <= 100.0);
    }

    #[test]
    fn boarding_capacity_serializes_stops() {
        let mut b = NetworkBuilder::new();
        b.add_node(Some(1));
        b.add_node(None);
        b.add_road(n(0), n(1), 100.0, 1000.0);
        b.set_demand(n(0), n(1), 100);
        b.add_route(vec![n(0), n(1)]);
        let net = b.build().unwrap();
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let mut sim = SimBuilder::new(config(Some(5.0)), net, fleet(3, 10, 1.0, 10.0), dispatch, transit(1.0))
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let slot = sim.world().node_guard(n(0)).unwrap();
        assert_eq!(sim.guard(slot).unwrap().peak_occupancy(), 1.0);
        let boarded: u32 = sim
            .sink()
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Boarding { count, .. } => Some(*count),
                _ => None,
            })
            .sum();
        assert_eq!(boarded, 30);
    }
}

// ── Route assignment and rerouting ────────────────────────────────────────────

#[cfg(test)]
mod dispatching {
    use super::*;

    struct Lazy;

    impl DispatchStrategy for Lazy {
        fn name(&self) -> &str {
            "lazy"
        }

        fn assign_route(&mut self, _: &Network, _: &mut Fleet) -> StrategyResult<()> {
            Ok(())
        }

        fn update_route(&mut self, _: &Network, _: &mut Vehicle, _: &DispatchFlags) -> RouteDecision {
            RouteDecision::RETIRE
        }
    }

    #[test]
    fn unassigned_vehicle_is_fatal() {
        let result = SimBuilder::new(config(None), scenario_a(), fleet(2, 10, 1.0, 10.0), Box::new(Lazy), transit(0.0))
            .build();
        assert!(matches!(result, Err(SimError::Unassigned { .. })));
    }

    #[test]
    fn bad_observe_interval_is_rejected() {
        let cfg = SimConfig { observe_interval: 0.0, ..SimConfig::default() };
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let result = SimBuilder::new(cfg, scenario_a(), fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0)).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn vehicle_longer_than_route_edge_is_rejected() {
        let mut b = NetworkBuilder::new();
        b.add_nodes(3, None);
        b.add_road(n(0), n(1), 100.0, 100.0);
        b.add_edge(n(1), n(2), 100.0, 100.0);
        b.add_edge(n(2), n(1), 100.0, 50.0);
        b.add_route(vec![n(0), n(1), n(2)]);
        let net = b.build().unwrap();
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let result = SimBuilder::new(config(None), net, fleet(1, 10, 60.0, 10.0), dispatch, transit(0.0)).build();
        let Err(SimError::Config(msg)) = result else { panic!("oversized vehicle was accepted") };
        assert!(msg.contains("capacity 50"), "{msg}");
    }

    #[test]
    fn scenario_c_three_to_one() {
        let mut b = NetworkBuilder::new();
        b.add_nodes(4, None);
        b.add_road(n(0), n(1), 10.0, 10.0);
        b.add_road(n(2), n(3), 10.0, 10.0);
        b.set_demand(n(0), n(1), 30);
        b.set_demand(n(2), n(3), 10);
        b.add_route(vec![n(0), n(1)]);
        b.add_route(vec![n(2), n(3)]);
        let net = b.build().unwrap();
        let dispatch = DispatchKind::DemandProportional.build(&retiring()).unwrap();
        let sim = SimBuilder::new(config(None), net, fleet(4, 10, 1.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        let routes: Vec<_> = sim.world().fleet.iter().map(|v| v.route.unwrap().0).collect();
        assert_eq!(routes, vec![0, 0, 0, 1]);
    }

    #[test]
    fn exhausted_vehicle_transfers_to_a_route_ending_here() {
        // Route 0 = 0 → 1; routes 1..=5 = 2 → 0, all sharing node 2's pool.
        let mut b = NetworkBuilder::new();
        b.add_nodes(3, None);
        b.add_road(n(0), n(1), 10.0, 10.0);
        b.add_road(n(2), n(0), 10.0, 10.0);
        b.set_demand(n(0), n(1), 5);
        b.set_demand(n(2), n(0), 5);
        b.add_route(vec![n(0), n(1)]);
        for _ in 0..5 {
            b.add_route(vec![n(2), n(0)]);
        }
        let net = b.build().unwrap();

        let dispatch = DispatchKind::DemandProportional.build(&retiring()).unwrap();
        let mut sim = SimBuilder::new(config(None), net, fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0))
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();

        assert_eq!(report.trips, vec![2]);
        assert_eq!((report.remaining_demand, report.drained, report.onboard), (0, 10, 0));
        let events = sim.sink().events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PassCompletion { pass: PassKind::Transfer, .. })));
        let starts: Vec<RouteId> = events
            .iter()
            .filter(|e| matches!(e, Event::TripStart { .. }))
            .map(Event::route)
            .collect();
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], RouteId(0));
        assert_ne!(starts[1], RouteId(0));
    }
}

// ── Whole-run properties ──────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use super::*;

    #[derive(Default)]
    struct Checker {
        advances: usize,
        ended:    usize,
        last:     Option<SimTime>,
    }

    impl SimObserver for Checker {
        fn on_time_advance(&mut self, now: SimTime, network: &Network, fleet: &Fleet) {
            if let Some(last) = self.last {
                assert!(now > last);
            }
            self.last = Some(now);
            self.advances += 1;
            assert!(fleet.iter().all(|v| v.onboard() <= v.capacity));
            let carried: u64 = fleet.iter().map(|v| u64::from(v.onboard())).sum();
            assert!(carried <= network.total_drained());
        }

        fn on_sim_end(&mut self, _: &RunReport) {
            self.ended += 1;
        }
    }

    #[test]
    fn evacuation_clears_all_demand() {
        let mut sim = evacuation_sim();
        let mut checker = Checker::default();
        let report = sim.run(&mut checker).unwrap();

        assert!(!report.truncated);
        assert_eq!(report.active_vehicles, 0);
        assert_eq!(report.remaining_demand, 0);
        assert_eq!(report.drained, 40);
        assert_eq!(report.onboard, 0);
        assert!(checker.advances > 0);
        assert_eq!(checker.ended, 1);

        let offloaded: u32 = sim
            .sink()
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Offloading { count, node, .. } => {
                    assert_eq!(*node, n(3));
                    Some(*count)
                }
                _ => None,
            })
            .sum();
        assert_eq!(offloaded, 40);
    }

    #[test]
    fn shelter_offloads_without_terminal_discharge() {
        let cfg = StrategyConfig { terminal_discharge: false, ..retiring() };
        let dispatch = DispatchKind::DemandProportional.build(&cfg).unwrap();
        let factory = VehicleKind::Evacuation.factory(&cfg).unwrap();
        let mut sim = SimBuilder::new(config(Some(5000.0)), evacuation_line(), fleet(2, 10, 10.0, 10.0), dispatch, factory)
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();

        assert!(!report.truncated);
        assert_eq!((report.remaining_demand, report.drained, report.onboard), (0, 40, 0));
        let offloads: Vec<NodeId> = sim
            .sink()
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Offloading { node, .. } => Some(*node),
                _ => None,
            })
            .collect();
        assert!(!offloads.is_empty());
        assert!(offloads.iter().all(|&node| node == n(3)));
    }

    #[test]
    fn drained_matches_demand_change() {
        let mut sim = evacuation_sim();
        let report = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(report.initial_demand, report.remaining_demand + report.drained);
    }

    #[test]
    fn edge_occupancy_stays_within_capacity() {
        let mut sim = evacuation_sim();
        sim.run(&mut NoopObserver).unwrap();
        for edge in sim.world().network.edges() {
            let guard = sim.world().edge_guard(edge.id).unwrap();
            let guard = sim.guard(guard).unwrap();
            assert!(guard.peak_occupancy() <= edge.capacity, "{}", edge.id);
            assert_eq!(guard.occupancy(), 0.0);
        }
    }

    #[test]
    fn identical_runs_log_identical_events() {
        let run = || {
            let mut sim = evacuation_sim();
            sim.run(&mut NoopObserver).unwrap();
            lines(&sim)
        };
        let first = run();
        assert!(!first.is_empty());
        assert_eq!(first, run());
    }

    #[test]
    fn every_line_parses_back() {
        let mut sim = evacuation_sim();
        sim.run(&mut NoopObserver).unwrap();
        for event in sim.sink().events() {
            let parsed: Event = event.to_string().parse().unwrap();
            assert_eq!(&parsed, event);
        }
    }
}

// ── Stop requests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod stopping {
    use super::*;

    struct StopAt {
        at:     f64,
        handle: StopHandle,
    }

    impl SimObserver for StopAt {
        fn on_time_advance(&mut self, now: SimTime, _: &Network, _: &Fleet) {
            if now.0 >= self.at {
                self.handle.request_stop();
            }
        }
    }

    #[test]
    fn stop_before_run_starts_no_trip() {
        let stop = StopHandle::new();
        stop.request_stop();
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        let mut sim = SimBuilder::new(config(None), scenario_a(), fleet(2, 10, 1.0, 10.0), dispatch, transit(0.0))
            .stop_handle(stop)
            .build()
            .unwrap();
        let report = sim.run(&mut NoopObserver).unwrap();
        assert!(sim.sink().is_empty());
        assert_eq!(report.trips, vec![0, 0]);
        assert_eq!(report.active_vehicles, 0);
    }

    #[test]
    fn stop_is_honored_at_trip_boundaries() {
        let stop = StopHandle::new();
        let dispatch = DispatchKind::RoundRobin.build(&StrategyConfig::default()).unwrap();
        // Round-robin repeats forever; only the stop request ends this run.
        let mut sim = SimBuilder::new(config(None), scenario_a(), fleet(1, 10, 1.0, 10.0), dispatch, transit(0.0))
            .stop_handle(stop.clone())
            .build()
            .unwrap();
        let report = sim.run(&mut StopAt { at: 30.0, handle: stop }).unwrap();

        assert!(!report.truncated);
        assert_eq!(report.active_vehicles, 0);
        assert_eq!(report.trips, vec![2]);
        let last = sim.sink().events().last().cloned().unwrap();
        assert!(matches!(last, Event::TripCompletion { trip: 2, .. }), "{last}");
    }
}
