//! The network aggregate and its builder.
//!
//! # Data layout
//!
//! Nodes, edges, and routes are dense `Vec`s indexed by their typed ids.  A
//! `FxHashMap<(from, to), EdgeId>` answers "which edge joins these two
//! nodes?", the only lookup a moving vehicle needs.
//!
//! Everything except node demand is immutable once built.  Demand is only
//! reachable for writing through a [`BoardingDesk`].

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use tsim_core::{EdgeId, EventSink, NodeId, RouteId, SimTime, VehicleId};

use crate::{BoardingDesk, Edge, NetworkError, NetworkResult, Node, Route};

// ── Network ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Network {
    nodes:      Vec<Node>,
    edges:      Vec<Edge>,
    routes:     Vec<Route>,
    edge_index: FxHashMap<(NodeId, NodeId), EdgeId>,
}

impl Network {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn node(&self, id: NodeId) -> NetworkResult<&Node> {
        self.nodes.get(id.index()).ok_or(NetworkError::UnknownNode(id))
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn route(&self, id: RouteId) -> NetworkResult<&Route> {
        self.routes.get(id.index()).ok_or(NetworkError::UnknownRoute(id))
    }

    /// The directed edge `from -> to`, if one exists.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edge_index.get(&(from, to)).map(|e| &self.edges[e.index()])
    }

    /// The edge a vehicle uses to move from `from` to `to`.
    ///
    /// Prefers the directed edge.  With `allow_reverse`, falls back to the
    /// edge `to -> from`, traversed against its direction.
    pub fn resolve_edge(&self, from: NodeId, to: NodeId, allow_reverse: bool) -> NetworkResult<&Edge> {
        if let Some(edge) = self.edge_between(from, to) {
            return Ok(edge);
        }
        if allow_reverse {
            if let Some(edge) = self.edge_between(to, from) {
                return Ok(edge);
            }
        }
        Err(NetworkError::NoEdge { from, to })
    }

    // ── Demand ────────────────────────────────────────────────────────────

    /// Remaining demand at `node` bound for `dest`.
    pub fn demand_to(&self, node: NodeId, dest: NodeId) -> u32 {
        self.nodes.get(node.index()).map_or(0, |n| n.demand_to(dest))
    }

    /// Remaining demand a route can serve: passengers waiting at any of its
    /// nodes whose destination is also on the route.  Repeated nodes are
    /// counted once.
    pub fn route_demand(&self, id: RouteId) -> u64 {
        let Some(route) = self.routes.get(id.index()) else {
            return 0;
        };
        let on_route: BTreeSet<NodeId> = route.nodes().iter().copied().collect();
        on_route
            .iter()
            .filter_map(|n| self.nodes.get(n.index()))
            .flat_map(|node| node.demand().iter())
            .filter(|(dest, _)| on_route.contains(dest))
            .map(|(_, &c)| u64::from(c))
            .sum()
    }

    /// Remaining demand across the whole network.
    pub fn total_demand(&self) -> u64 {
        self.nodes.iter().map(Node::total_demand).sum()
    }

    /// Passengers drained across the whole network.
    pub fn total_drained(&self) -> u64 {
        self.nodes.iter().map(Node::drained).sum()
    }

    // ── Boarding ──────────────────────────────────────────────────────────

    /// Open a boarding desk at `node` for one vehicle visit.
    pub fn desk<'a>(
        &'a mut self,
        node:    NodeId,
        route:   RouteId,
        vehicle: VehicleId,
        now:     SimTime,
        log:     &'a mut dyn EventSink,
    ) -> NetworkResult<BoardingDesk<'a>> {
        let node = self.nodes.get_mut(node.index()).ok_or(NetworkError::UnknownNode(node))?;
        Ok(BoardingDesk::new(node, route, vehicle, now, log))
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Incrementally assemble a [`Network`], then validate it in [`build`][Self::build].
#[derive(Default)]
pub struct NetworkBuilder {
    nodes:  Vec<Node>,
    edges:  Vec<(NodeId, NodeId, f64, f64)>,
    demand: Vec<(NodeId, NodeId, u32)>,
    routes: Vec<Vec<NodeId>>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.  `boarding_capacity = None` means unlimited.
    pub fn add_node(&mut self, boarding_capacity: Option<u32>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, boarding_capacity));
        id
    }

    /// Add `n` nodes with the same boarding capacity.
    pub fn add_nodes(&mut self, n: usize, boarding_capacity: Option<u32>) {
        for _ in 0..n {
            self.add_node(boarding_capacity);
        }
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, length: f64, capacity: f64) {
        self.edges.push((from, to, length, capacity));
    }

    /// Add the edge in both directions.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length: f64, capacity: f64) {
        self.add_edge(a, b, length, capacity);
        self.add_edge(b, a, length, capacity);
    }

    /// Set the passengers waiting at `at` for `dest`.
    pub fn set_demand(&mut self, at: NodeId, dest: NodeId, count: u32) {
        self.demand.push((at, dest, count));
    }

    pub fn add_route(&mut self, nodes: Vec<NodeId>) -> RouteId {
        self.routes.push(nodes);
        RouteId((self.routes.len() - 1) as u32)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validate and freeze.
    ///
    /// Rejects: edges or demand touching unknown nodes, non-finite or
    /// negative lengths, capacities below 1, duplicate edges, nodes with a
    /// boarding capacity of zero, empty routes, and routes that step between
    /// two nodes with no edge.
    pub fn build(self) -> NetworkResult<Network> {
        let mut nodes = self.nodes;
        let n = nodes.len();
        let known = |id: NodeId| if id.index() < n { Ok(id) } else { Err(NetworkError::UnknownNode(id)) };

        for node in &nodes {
            if node.boarding_capacity == Some(0) {
                return Err(NetworkError::InvalidNode {
                    node:   node.id,
                    reason: "boarding capacity must be at least 1".into(),
                });
            }
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        let mut edge_index = FxHashMap::default();
        for (from, to, length, capacity) in self.edges {
            known(from)?;
            known(to)?;
            if !length.is_finite() || length < 0.0 {
                return Err(NetworkError::InvalidEdge { from, to, reason: format!("bad length {length}") });
            }
            if !capacity.is_finite() || capacity < 1.0 {
                return Err(NetworkError::InvalidEdge { from, to, reason: format!("capacity {capacity} below 1") });
            }
            let id = EdgeId(edges.len() as u32);
            if edge_index.insert((from, to), id).is_some() {
                return Err(NetworkError::DuplicateEdge { from, to });
            }
            edges.push(Edge { id, from, to, length, capacity });
        }

        for (at, dest, count) in self.demand {
            known(at)?;
            known(dest)?;
            nodes[at.index()].set_demand(dest, count);
        }

        let mut routes = Vec::with_capacity(self.routes.len());
        for (i, route_nodes) in self.routes.into_iter().enumerate() {
            let id = RouteId(i as u32);
            if route_nodes.is_empty() {
                return Err(NetworkError::EmptyRoute(id));
            }
            for &node in &route_nodes {
                known(node)?;
            }
            for pair in route_nodes.windows(2) {
                if !edge_index.contains_key(&(pair[0], pair[1])) {
                    return Err(NetworkError::RouteGap { route: id, from: pair[0], to: pair[1] });
                }
            }
            routes.push(Route::new(id, route_nodes));
        }

        Ok(Network { nodes, edges, routes, edge_index })
    }
}
