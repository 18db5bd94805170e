//! Transfer pass shared by the reference vehicle strategies.

use tsim_core::NodeId;

use crate::{Step, TripView};

/// Brings a rerouted vehicle to the start of its new route.
///
/// Rerouting only picks routes whose terminal is the vehicle's current
/// node, so the transfer walks the new route backwards from its terminal to
/// its start.  A vehicle already at the start does not move.  A vehicle
/// anywhere else does not move either, and the simulation reports the
/// transfer as incomplete.
#[derive(Clone, Debug, Default)]
pub struct ReturnTransfer {
    path:   Option<Vec<NodeId>>,
    cursor: usize,
}

impl ReturnTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, trip: &TripView<'_>) -> Step {
        let path = self.path.get_or_insert_with(|| {
            let here = trip.current_node();
            if here == trip.route.last() {
                trip.route.nodes().iter().rev().copied().collect()
            } else {
                vec![here]
            }
        });
        if self.cursor + 1 < path.len() {
            self.cursor += 1;
            Step::advance(path[self.cursor], false, 0.0)
        } else {
            self.path = None;
            self.cursor = 0;
            Step::finish(false, 0.0)
        }
    }
}
