//! Reference dispatch policies.

use tracing::debug;

use tsim_core::{RouteId, SimRng};
use tsim_network::{Fleet, Network, Vehicle};

use crate::{DispatchFlags, DispatchStrategy, ExhaustedRoute, RouteDecision, StrategyError, StrategyResult};

fn require_routes(network: &Network, fleet: &Fleet) -> StrategyResult<()> {
    if network.route_count() == 0 && !fleet.is_empty() {
        return Err(StrategyError::NoRoutes { vehicles: fleet.len() });
    }
    Ok(())
}

/// Put `vehicle` at the start of `route`, leaving after `departure`.
fn place(network: &Network, vehicle: &mut Vehicle, route: RouteId, departure: f64) -> StrategyResult<()> {
    let start = network.route(route)?.first();
    vehicle.route = Some(route);
    vehicle.current_node = Some(start);
    vehicle.departure = departure;
    Ok(())
}

// ── Round-robin ───────────────────────────────────────────────────────────────

/// Vehicle `i` gets route `i mod R`; every vehicle departs immediately and
/// repeats its route forever.
#[derive(Debug, Default)]
pub struct RoundRobinDispatch;

impl DispatchStrategy for RoundRobinDispatch {
    fn name(&self) -> &str {
        "round-robin"
    }

    fn assign_route(&mut self, network: &Network, fleet: &mut Fleet) -> StrategyResult<()> {
        require_routes(network, fleet)?;
        let routes = network.route_count();
        for (i, vehicle) in fleet.iter_mut().enumerate() {
            place(network, vehicle, RouteId((i % routes) as u32), 0.0)?;
        }
        Ok(())
    }

    fn update_route(&mut self, _: &Network, _: &mut Vehicle, _: &DispatchFlags) -> RouteDecision {
        RouteDecision::REPEAT
    }
}

// ── Demand-proportional ───────────────────────────────────────────────────────

/// Allots vehicles to routes in proportion to the demand each route can
/// serve, then reroutes vehicles whose route runs dry.
///
/// # Assignment
///
/// With route demands `d_r`, total `D`, and `F` vehicles, route `r` gets
/// `floor(d_r * F / D)` consecutive vehicle ids, routes taken in id order.
/// Leftover vehicles are dealt round-robin starting at route 0.  Vehicles
/// sharing a route depart `departure_gap` apart.  If `D == 0` the whole
/// fleet is dealt round-robin.
///
/// # Rerouting
///
/// After each trip the vehicle's route demand is recomputed.  While it is
/// positive the vehicle repeats.  Once it is zero, up to `R` routes are
/// drawn at random (with replacement); the first whose terminal is the
/// vehicle's current node and whose demand is positive becomes the new
/// route and the vehicle transfers to its start.  If none is found, the
/// [`ExhaustedRoute`] policy applies.
pub struct DemandProportionalDispatch {
    departure_gap: f64,
    exhausted:     ExhaustedRoute,
    rng:           SimRng,
}

impl DemandProportionalDispatch {
    pub fn new(departure_gap: f64, exhausted: ExhaustedRoute, seed: u64) -> Self {
        Self { departure_gap, exhausted, rng: SimRng::new(seed) }
    }

    /// Vehicles per route under the proportional rule, before leftovers.
    pub fn allotment(route_demands: &[u64], fleet_size: usize) -> Vec<usize> {
        let total: u64 = route_demands.iter().sum();
        if total == 0 {
            return vec![0; route_demands.len()];
        }
        let f = fleet_size as u128;
        route_demands
            .iter()
            .map(|&d| (u128::from(d) * f / u128::from(total)) as usize)
            .collect()
    }
}

impl DispatchStrategy for DemandProportionalDispatch {
    fn name(&self) -> &str {
        "demand-proportional"
    }

    fn assign_route(&mut self, network: &Network, fleet: &mut Fleet) -> StrategyResult<()> {
        require_routes(network, fleet)?;
        let routes = network.route_count();
        let demands: Vec<u64> = (0..routes).map(|r| network.route_demand(RouteId(r as u32))).collect();
        let allotment = Self::allotment(&demands, fleet.len());
        let mut next_departure = vec![0.0_f64; routes];

        let mut plan: Vec<usize> = allotment
            .iter()
            .enumerate()
            .flat_map(|(r, &count)| std::iter::repeat_n(r, count))
            .collect();
        let proportional = plan.len();
        plan.extend((0..fleet.len() - proportional).map(|i| i % routes));

        for (vehicle, &r) in fleet.iter_mut().zip(&plan) {
            place(network, vehicle, RouteId(r as u32), next_departure[r])?;
            next_departure[r] += self.departure_gap;
        }
        debug!(?demands, ?allotment, leftover = fleet.len() - proportional, "routes assigned");
        Ok(())
    }

    fn update_route(&mut self, network: &Network, vehicle: &mut Vehicle, _: &DispatchFlags) -> RouteDecision {
        let Some(current_route) = vehicle.route else {
            return RouteDecision::RETIRE;
        };
        let remaining = network.route_demand(current_route);
        if remaining > 0 {
            return RouteDecision::REPEAT;
        }

        let here = vehicle.current_node;
        let routes = network.routes();
        for _ in 0..routes.len() {
            let Some(candidate) = self.rng.choose(routes) else {
                break;
            };
            if Some(candidate.last()) == here && network.route_demand(candidate.id()) > 0 {
                debug!(
                    vehicle = vehicle.id.0,
                    from = current_route.0,
                    to = candidate.id().0,
                    "rerouted"
                );
                vehicle.route = Some(candidate.id());
                return RouteDecision::TRANSFER;
            }
        }

        debug!(vehicle = vehicle.id.0, route = current_route.0, policy = ?self.exhausted, "no reroute candidate");
        match self.exhausted {
            ExhaustedRoute::Repeat => RouteDecision::REPEAT,
            ExhaustedRoute::Retire => RouteDecision::RETIRE,
        }
    }
}
