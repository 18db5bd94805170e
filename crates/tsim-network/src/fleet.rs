//! Vehicles and the fleet registry.

use std::collections::BTreeMap;

use tsim_core::{NodeId, RouteId, VehicleId};

use crate::{NetworkError, NetworkResult};

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// One fleet unit.
///
/// Static attributes (`capacity`, `length`, `speed`) come from the fleet
/// manifest.  `route`, `current_node`, and `departure` are set by the
/// dispatch strategy; `current_node` then follows the vehicle as it moves.
#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id:       VehicleId,
    /// Vehicle class name from the manifest (e.g. `bus`).
    pub class:    String,
    /// Passenger capacity.
    pub capacity: u32,
    /// Physical length, in edge-capacity units.
    pub length:   f64,
    pub speed:    f64,

    pub current_node: Option<NodeId>,
    pub route:        Option<RouteId>,
    /// Delay between the go signal and the first trip.
    pub departure:    f64,

    manifest:   BTreeMap<NodeId, u32>,
    onboard:    u32,
    trip_count: u32,
}

impl Vehicle {
    pub fn new(id: VehicleId, class: impl Into<String>, capacity: u32, length: f64, speed: f64) -> Self {
        Self {
            id,
            class: class.into(),
            capacity,
            length,
            speed,
            current_node: None,
            route: None,
            departure: 0.0,
            manifest: BTreeMap::new(),
            onboard: 0,
            trip_count: 0,
        }
    }

    /// Passengers on board, per destination.
    pub fn manifest(&self) -> &BTreeMap<NodeId, u32> {
        &self.manifest
    }

    /// Passengers on board bound for `dest`.
    pub fn carrying(&self, dest: NodeId) -> u32 {
        self.manifest.get(&dest).copied().unwrap_or(0)
    }

    pub fn onboard(&self) -> u32 {
        self.onboard
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.capacity - self.onboard
    }

    pub fn is_full(&self) -> bool {
        self.onboard >= self.capacity
    }

    /// Completed trips.
    pub fn trip_count(&self) -> u32 {
        self.trip_count
    }

    /// Count one more completed trip and return the new total.
    pub fn complete_trip(&mut self) -> u32 {
        self.trip_count += 1;
        self.trip_count
    }

    /// Add passengers for `dest`, clamped to the free seats.  Returns how
    /// many were actually loaded.
    pub(crate) fn load(&mut self, dest: NodeId, count: u32) -> u32 {
        let loaded = count.min(self.remaining_capacity());
        *self.manifest.entry(dest).or_insert(0) += loaded;
        self.onboard += loaded;
        assert!(self.onboard <= self.capacity, "vehicle {} over capacity", self.id);
        loaded
    }

    /// Remove every passenger bound for `node` and return how many left.
    pub(crate) fn unload(&mut self, node: NodeId) -> u32 {
        let Some(count) = self.manifest.get_mut(&node) else {
            return 0;
        };
        let leaving = std::mem::take(count);
        self.onboard -= leaving;
        leaving
    }
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

/// Every vehicle in the run, indexed by `VehicleId`.  Membership is fixed.
#[derive(Clone, Debug, Default)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
}

impl Fleet {
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.index())
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.index())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vehicle> {
        self.vehicles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Vehicle> {
        self.vehicles.iter_mut()
    }

    /// Vehicles without a route or a starting node.
    pub fn unassigned(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.vehicles
            .iter()
            .filter(|v| v.route.is_none() || v.current_node.is_none())
            .map(|v| v.id)
    }
}

impl<'a> IntoIterator for &'a Fleet {
    type Item = &'a Vehicle;
    type IntoIter = std::slice::Iter<'a, Vehicle>;

    fn into_iter(self) -> Self::IntoIter {
        self.vehicles.iter()
    }
}

// ── FleetBuilder ──────────────────────────────────────────────────────────────

/// Builds a [`Fleet`] class by class; ids are assigned in insertion order.
#[derive(Default)]
pub struct FleetBuilder {
    vehicles: Vec<Vehicle>,
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` identical vehicles.
    pub fn add_class(
        &mut self,
        name:     &str,
        capacity: u32,
        length:   f64,
        speed:    f64,
        count:    u32,
    ) -> NetworkResult<&mut Self> {
        let invalid = |reason: &str| NetworkError::InvalidVehicleClass {
            name:   name.to_string(),
            reason: reason.to_string(),
        };
        if capacity == 0 {
            return Err(invalid("capacity must be at least 1"));
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(invalid("length must be positive"));
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(invalid("speed must be positive"));
        }
        for _ in 0..count {
            let id = VehicleId(self.vehicles.len() as u32);
            self.vehicles.push(Vehicle::new(id, name, capacity, length, speed));
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn build(self) -> Fleet {
        Fleet { vehicles: self.vehicles }
    }
}
