//! Network and fleet error type.

use thiserror::Error;

use tsim_core::{NodeId, RouteId};

/// Errors produced while building or loading a network or fleet.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("node {0} not found in network")]
    UnknownNode(NodeId),

    #[error("route {0} not found in network")]
    UnknownRoute(RouteId),

    #[error("no edge from {from} to {to}")]
    NoEdge { from: NodeId, to: NodeId },

    #[error("edge {from} -> {to} declared twice")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("edge {from} -> {to}: {reason}")]
    InvalidEdge { from: NodeId, to: NodeId, reason: String },

    #[error("node {node}: {reason}")]
    InvalidNode { node: NodeId, reason: String },

    #[error("route {0} has no nodes")]
    EmptyRoute(RouteId),

    #[error("route {route} steps from {from} to {to} but no such edge exists")]
    RouteGap { route: RouteId, from: NodeId, to: NodeId },

    #[error("vehicle class {name:?}: {reason}")]
    InvalidVehicleClass { name: String, reason: String },

    #[error("{file}:{line}: {msg}")]
    Parse { file: String, line: usize, msg: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
