//! State shared by every process of one run.

use tsim_core::{EdgeId, GuardId, NodeId, RouteId, VehicleId};
use tsim_network::{Fleet, Network, Vehicle};

use crate::{Dispatcher, SimError, SimResult, StopHandle};

/// Everything a vehicle or dispatcher process may read or change.
///
/// Processes receive `&mut World` on every resumption.  Since only one
/// process runs at a time, no further synchronization is needed.
pub struct World<S> {
    pub network:    Network,
    pub fleet:      Fleet,
    pub dispatcher: Dispatcher,
    /// Event log sink.
    pub sink:       S,

    /// Boarding guard per node, indexed by `NodeId`.
    pub(crate) node_guards: Vec<GuardId>,
    /// Occupancy guard per edge, indexed by `EdgeId`.
    pub(crate) edge_guards: Vec<GuardId>,

    pub(crate) stop:                  StopHandle,
    pub(crate) observe_interval:      f64,
    pub(crate) reverse_edge_fallback: bool,
}

impl<S> World<S> {
    pub fn vehicle(&self, id: VehicleId) -> SimResult<&Vehicle> {
        self.fleet.get(id).ok_or(SimError::UnknownVehicle(id))
    }

    pub fn node_guard(&self, node: NodeId) -> Option<GuardId> {
        self.node_guards.get(node.index()).copied()
    }

    pub fn edge_guard(&self, edge: EdgeId) -> Option<GuardId> {
        self.edge_guards.get(edge.index()).copied()
    }
}

/// The route a vehicle is currently assigned to.
pub(crate) fn route_of(vehicle: &Vehicle) -> SimResult<RouteId> {
    vehicle.route.ok_or(SimError::Unassigned { vehicle: vehicle.id })
}

/// The node a vehicle is currently at.
pub(crate) fn node_of(vehicle: &Vehicle) -> SimResult<NodeId> {
    vehicle.current_node.ok_or(SimError::Unassigned { vehicle: vehicle.id })
}
