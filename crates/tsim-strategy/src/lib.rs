//! `tsim-strategy`: the pluggable policy layer of the fleet simulator.
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`protocol`]   | `DispatchStrategy`, `VehicleStrategy`, `Step`, `TripView`     |
//! | [`dispatch`]   | `RoundRobinDispatch`, `DemandProportionalDispatch`            |
//! | [`transit`]    | `TransitVehicle`: stop everywhere, out and back               |
//! | [`evacuation`] | `EvacuationVehicle`: pickups to shelter, refined return leg   |
//! | [`transfer`]   | `ReturnTransfer`: move to the start of a new route            |
//! | [`config`]     | `StrategyConfig` and policy enums                             |
//! | [`registry`]   | `DispatchKind`, `VehicleKind`: select policies by name        |
//! | [`error`]      | `StrategyError`, `StrategyResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to `StrategyConfig`.        |

pub mod config;
pub mod dispatch;
pub mod error;
pub mod evacuation;
pub mod protocol;
pub mod registry;
pub mod transfer;
pub mod transit;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{BackwardTruncation, ExhaustedRoute, StrategyConfig};
pub use dispatch::{DemandProportionalDispatch, RoundRobinDispatch};
pub use error::{StrategyError, StrategyResult};
pub use evacuation::EvacuationVehicle;
pub use protocol::{DispatchFlags, DispatchStrategy, RouteDecision, Step, TripView, VehicleStrategy};
pub use registry::{DispatchKind, VehicleFactory, VehicleKind};
pub use transfer::ReturnTransfer;
pub use transit::TransitVehicle;
