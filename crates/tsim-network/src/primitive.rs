//! `Node`, `Edge`, and `Route`: the entities of the network graph.

use std::collections::BTreeMap;

use tsim_core::{EdgeId, NodeId, RouteId};

// ── Node ──────────────────────────────────────────────────────────────────────

/// A stop, junction, or shelter.
///
/// Holds the passenger pool waiting here, keyed by destination.  The pool is
/// a `BTreeMap` so every iteration over it (boarding, demand sums) visits
/// destinations in ascending id order.  The only way to shrink it is
/// [`BoardingDesk::drain`][crate::BoardingDesk::drain].
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,

    /// Maximum number of vehicles boarding at once.  `None` = unlimited.
    pub boarding_capacity: Option<u32>,

    demand:  BTreeMap<NodeId, u32>,
    drained: u64,
}

impl Node {
    pub(crate) fn new(id: NodeId, boarding_capacity: Option<u32>) -> Self {
        Self { id, boarding_capacity, demand: BTreeMap::new(), drained: 0 }
    }

    pub(crate) fn set_demand(&mut self, dest: NodeId, count: u32) {
        self.demand.insert(dest, count);
    }

    /// Remaining demand per destination.
    pub fn demand(&self) -> &BTreeMap<NodeId, u32> {
        &self.demand
    }

    /// Remaining demand to `dest`; zero if there never was any.
    pub fn demand_to(&self, dest: NodeId) -> u32 {
        self.demand.get(&dest).copied().unwrap_or(0)
    }

    /// Remaining demand to every destination.
    pub fn total_demand(&self) -> u64 {
        self.demand.values().map(|&c| u64::from(c)).sum()
    }

    /// Passengers drained from this node so far.
    pub fn drained(&self) -> u64 {
        self.drained
    }

    /// Take up to `requested` passengers bound for `dest`.
    ///
    /// Returns `None` if the node has no pool entry for `dest`, otherwise the
    /// number actually taken, which is never more than what is waiting.
    pub(crate) fn drain(&mut self, dest: NodeId, requested: u32) -> Option<u32> {
        let waiting = self.demand.get_mut(&dest)?;
        let taken = requested.min(*waiting);
        *waiting -= taken;
        self.drained += u64::from(taken);
        Some(taken)
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// A directed road segment.
///
/// `capacity` is measured in the same units as vehicle length: the sum of
/// the lengths of the vehicles on the edge may not exceed it.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id:       EdgeId,
    pub from:     NodeId,
    pub to:       NodeId,
    pub length:   f64,
    pub capacity: f64,
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered list of nodes a vehicle serves.  Nodes may repeat.
///
/// Routes are validated non-empty at build time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    id:    RouteId,
    nodes: Vec<NodeId>,
}

impl Route {
    pub(crate) fn new(id: RouteId, nodes: Vec<NodeId>) -> Self {
        Self { id, nodes }
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Start node.
    pub fn first(&self) -> NodeId {
        self.nodes.first().copied().unwrap_or(NodeId::INVALID)
    }

    /// Terminal node.
    pub fn last(&self) -> NodeId {
        self.nodes.last().copied().unwrap_or(NodeId::INVALID)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}
