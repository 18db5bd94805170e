//! Strategy error type.

use thiserror::Error;

use tsim_network::NetworkError;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("unknown {kind} strategy {name:?} (expected one of: {expected})")]
    UnknownStrategy {
        kind:     &'static str,
        name:     String,
        expected: &'static str,
    },

    #[error("cannot assign {vehicles} vehicles: the network has no routes")]
    NoRoutes { vehicles: usize },

    #[error("invalid strategy configuration: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

pub type StrategyResult<T> = Result<T, StrategyError>;
