//! Ordinary transit service: stop everywhere, carry anyone riding the line.

use tsim_core::NodeId;
use tsim_network::{BoardingDesk, Vehicle};

use crate::{ReturnTransfer, Step, TripView, VehicleStrategy};

/// Runs the route out and back, stopping at every node for `dwell` time
/// units.  Boards passengers for any destination on the route.
///
/// The turnaround node is served once, at the end of the forward pass.  The
/// backward pass ends with a stop at the route start.
#[derive(Clone, Debug)]
pub struct TransitVehicle {
    dwell:    f64,
    forward:  Vec<NodeId>,
    backward: Vec<NodeId>,
    cursor:   usize,
    transfer: ReturnTransfer,
}

impl TransitVehicle {
    pub fn new(dwell: f64) -> Self {
        Self {
            dwell,
            forward: Vec::new(),
            backward: Vec::new(),
            cursor: 0,
            transfer: ReturnTransfer::new(),
        }
    }
}

impl VehicleStrategy for TransitVehicle {
    fn plan_trip(&mut self, trip: &TripView<'_>) {
        self.forward = trip.route.nodes().to_vec();
        self.backward = self.forward.iter().rev().copied().collect();
        self.cursor = 0;
    }

    fn next_forward_node(&mut self, _: &TripView<'_>) -> Step {
        if self.cursor + 1 < self.forward.len() {
            self.cursor += 1;
            Step::advance(self.forward[self.cursor], true, self.dwell)
        } else {
            self.cursor = 0;
            Step::finish(true, self.dwell)
        }
    }

    fn next_backward_node(&mut self, _: &TripView<'_>) -> Step {
        let at_turnaround = self.cursor == 0;
        if self.cursor + 1 < self.backward.len() {
            self.cursor += 1;
            let dwell = if at_turnaround { 0.0 } else { self.dwell };
            Step::advance(self.backward[self.cursor], !at_turnaround, dwell)
        } else {
            self.cursor = 0;
            // A single-node route turns around where it stopped already.
            let stop = !at_turnaround;
            Step::finish(stop, if stop { self.dwell } else { 0.0 })
        }
    }

    fn next_transfer_node(&mut self, trip: &TripView<'_>) -> Step {
        self.transfer.next(trip)
    }

    fn passenger_fill(&mut self, vehicle: &mut Vehicle, desk: &mut BoardingDesk<'_>) -> u32 {
        let here = desk.node_id();
        let waiting: Vec<(NodeId, u32)> = desk
            .demand()
            .iter()
            .filter(|&(&dest, &count)| count > 0 && dest != here && self.forward.contains(&dest))
            .map(|(&dest, &count)| (dest, count))
            .collect();

        let mut boarded = 0;
        for (dest, count) in waiting {
            if vehicle.is_full() {
                break;
            }
            boarded += desk.board(vehicle, dest, count);
        }
        boarded
    }
}
