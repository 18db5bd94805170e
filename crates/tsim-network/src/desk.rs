//! `BoardingDesk`: the data side of a node's boarding guard.
//!
//! A desk is opened for one vehicle visit at one node, after the vehicle has
//! been admitted by the node's boarding slot.  It is the only handle through
//! which node demand can be decreased, and it writes a `boarding` or
//! `offloading` event for every passenger movement.
//!
//! Requests are clamped rather than rejected: asking for more passengers
//! than are waiting, or more than the vehicle has seats for, boards what is
//! available and leaves the rest in the pool.

use std::collections::BTreeMap;

use tsim_core::{Event, EventSink, NodeId, RouteId, SimTime, VehicleId};

use crate::{Node, Vehicle};

pub struct BoardingDesk<'a> {
    node:    &'a mut Node,
    route:   RouteId,
    vehicle: VehicleId,
    now:     SimTime,
    log:     &'a mut dyn EventSink,
}

impl<'a> BoardingDesk<'a> {
    pub(crate) fn new(
        node:    &'a mut Node,
        route:   RouteId,
        vehicle: VehicleId,
        now:     SimTime,
        log:     &'a mut dyn EventSink,
    ) -> Self {
        Self { node, route, vehicle, now, log }
    }

    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Remaining demand at this node, per destination.
    pub fn demand(&self) -> &BTreeMap<NodeId, u32> {
        self.node.demand()
    }

    pub fn demand_to(&self, dest: NodeId) -> u32 {
        self.node.demand_to(dest)
    }

    /// Remove up to `requested` passengers bound for `dest` from the pool.
    ///
    /// Returns `min(requested, waiting)`.  Logs a `boarding` event whenever
    /// the node has a pool entry for `dest`, even if nothing was taken.
    pub fn drain(&mut self, dest: NodeId, requested: u32) -> u32 {
        let Some(taken) = self.node.drain(dest, requested) else {
            return 0;
        };
        self.log.record(&Event::Boarding {
            route:   self.route,
            vehicle: self.vehicle,
            count:   taken,
            dest,
            node:    self.node.id,
            at:      self.now,
        });
        taken
    }

    /// Board passengers for `dest` onto `vehicle`.
    ///
    /// The request is clamped to the vehicle's free seats and to the waiting
    /// demand.  Returns the number boarded.
    pub fn board(&mut self, vehicle: &mut Vehicle, dest: NodeId, requested: u32) -> u32 {
        debug_assert_eq!(vehicle.id, self.vehicle, "desk opened for another vehicle");
        let want = requested.min(vehicle.remaining_capacity());
        if want == 0 {
            return 0;
        }
        let taken = self.drain(dest, want);
        let loaded = vehicle.load(dest, taken);
        debug_assert_eq!(loaded, taken);
        taken
    }

    /// Let off every passenger bound for this node.  Returns how many left.
    pub fn offload(&mut self, vehicle: &mut Vehicle) -> u32 {
        let count = vehicle.unload(self.node.id);
        if count > 0 {
            self.log.record(&Event::Offloading {
                route:   self.route,
                vehicle: self.vehicle,
                count,
                node:    self.node.id,
                at:      self.now,
            });
        }
        count
    }
}
