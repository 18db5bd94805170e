use thiserror::Error;

use tsim_core::{NodeId, VehicleId};
use tsim_kernel::KernelError;
use tsim_network::NetworkError;
use tsim_strategy::StrategyError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("vehicle {vehicle} has no route or starting node after route assignment")]
    Unassigned { vehicle: VehicleId },

    #[error("vehicle {0} is not in the fleet")]
    UnknownVehicle(VehicleId),

    #[error("vehicle {vehicle}: {msg}")]
    Protocol { vehicle: VehicleId, msg: String },

    #[error("vehicle {vehicle} ended its transfer at {at}, not at route start {start}")]
    TransferIncomplete {
        vehicle: VehicleId,
        at:      NodeId,
        start:   NodeId,
    },

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

pub type SimResult<T> = Result<T, SimError>;
