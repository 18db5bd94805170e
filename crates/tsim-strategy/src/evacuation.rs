//! Evacuation service: shuttle evacuees from pickup stops to the shelter at
//! the end of the route.
//!
//! # Greedy backward refinement
//!
//! A vehicle fills up at the earliest stops first, so late in an evacuation
//! the stops near the route start are often empty while stops nearer the
//! shelter still have people waiting.  Instead of driving all the way back
//! to the start, the backward pass is recomputed at the shelter from the
//! live demand:
//!
//! ```text
//! route:    A ── B ── C ── D ── S(helter)
//! demand:   0    0    4    0
//! backward: S → D → C            (turn around at C)
//! ```
//!
//! The next forward pass then starts from where the backward pass ended.
//! Which stops count as "still worth returning to" is set by
//! [`BackwardTruncation`].

use std::collections::BTreeSet;

use tsim_core::NodeId;
use tsim_network::{BoardingDesk, Network, Vehicle};

use crate::{BackwardTruncation, ReturnTransfer, Step, StrategyConfig, TripView, VehicleStrategy};

#[derive(Clone, Debug)]
pub struct EvacuationVehicle {
    stop_time:          f64,
    truncation:         BackwardTruncation,
    terminal_discharge: bool,

    forward:  Vec<NodeId>,
    backward: Vec<NodeId>,
    refined:  Vec<NodeId>,
    /// Nodes that had evacuees for the shelter when the trip was planned.
    pickups:  BTreeSet<NodeId>,
    cursor:   usize,
    transfer: ReturnTransfer,
}

impl EvacuationVehicle {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            stop_time:          config.evacuation_stop_time(),
            truncation:         config.backward_truncation,
            terminal_discharge: config.terminal_discharge,
            forward:            Vec::new(),
            backward:           Vec::new(),
            refined:            Vec::new(),
            pickups:            BTreeSet::new(),
            cursor:             0,
            transfer:           ReturnTransfer::new(),
        }
    }

    fn shelter(&self) -> NodeId {
        self.forward.last().copied().unwrap_or(NodeId::INVALID)
    }

    /// The backward pass computed at the start of the last return leg.
    pub fn refined_backward(&self) -> &[NodeId] {
        &self.refined
    }

    /// Recompute the return leg from live demand.
    fn refine(&mut self, network: &Network) {
        let shelter = self.shelter();
        let Some((&turnaround, rest)) = self.backward.split_first() else {
            self.refined.clear();
            return;
        };
        self.refined = vec![turnaround];
        let mut between: Vec<NodeId> = Vec::new();
        for &node in rest {
            if !self.pickups.contains(&node) {
                between.push(node);
                continue;
            }
            if network.demand_to(node, shelter) > 0 {
                self.refined.append(&mut between);
                self.refined.push(node);
            } else {
                match self.truncation {
                    BackwardTruncation::FirstExhausted => break,
                    BackwardTruncation::FarthestDemand => between.push(node),
                }
            }
        }
    }
}

/// Whether `node` has anyone waiting to go anywhere.
fn own_demand(network: &Network, node: NodeId) -> bool {
    network.node(node).is_ok_and(|n| n.total_demand() > 0)
}

impl VehicleStrategy for EvacuationVehicle {
    fn plan_trip(&mut self, trip: &TripView<'_>) {
        self.forward = trip.route.nodes().to_vec();
        self.backward = self.forward.iter().rev().copied().collect();
        self.refined.clear();
        let shelter = self.shelter();
        self.pickups = self
            .forward
            .iter()
            .copied()
            .filter(|&n| n != shelter && trip.network.demand_to(n, shelter) > 0)
            .collect();
        // A refined return leg leaves the vehicle part-way along the route.
        let here = trip.current_node();
        self.cursor = self.forward.iter().position(|&n| n == here).unwrap_or(0);
    }

    fn next_forward_node(&mut self, trip: &TripView<'_>) -> Step {
        let here = trip.current_node();
        let shelter = self.shelter();
        let is_last = self.cursor + 1 >= self.forward.len();
        let stop = if is_last {
            self.terminal_discharge || trip.vehicle.carrying(shelter) > 0 || own_demand(trip.network, here)
        } else {
            trip.network.demand_to(here, shelter) > 0
        };
        let wait = if stop { self.stop_time } else { 0.0 };
        if !is_last {
            self.cursor += 1;
            Step::advance(self.forward[self.cursor], stop, wait)
        } else {
            self.cursor = 0;
            Step::finish(stop, wait)
        }
    }

    fn next_backward_node(&mut self, trip: &TripView<'_>) -> Step {
        if self.cursor == 0 {
            self.refine(trip.network);
        }
        if self.cursor + 1 < self.refined.len() {
            self.cursor += 1;
            Step::advance(self.refined[self.cursor], false, 0.0)
        } else {
            // The next forward pass resumes where this one turned around.
            self.cursor = self.forward.len().saturating_sub(self.refined.len().max(1));
            Step::finish(false, 0.0)
        }
    }

    fn next_transfer_node(&mut self, trip: &TripView<'_>) -> Step {
        self.transfer.next(trip)
    }

    fn passenger_fill(&mut self, vehicle: &mut Vehicle, desk: &mut BoardingDesk<'_>) -> u32 {
        let shelter = self.shelter();
        let waiting = desk.demand_to(shelter);
        if desk.node_id() == shelter || waiting == 0 || vehicle.is_full() {
            return 0;
        }
        desk.board(vehicle, shelter, waiting)
    }
}
