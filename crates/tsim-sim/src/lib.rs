//! `tsim-sim`: run orchestration for the tsim fleet simulator.
//!
//! # Processes
//!
//! ```text
//! t = 0   Simulation::run fires `life`
//!         DispatcherProcess: life ─▶ fire `go` ─▶ observe every interval ─▶ done when no vehicle is active
//!         VehicleProcess × F: go ─▶ departure ─▶ trips until retired or stopped
//! ```
//!
//! A vehicle trip is a forward pass, a backward pass, and, when the dispatch
//! strategy reroutes the vehicle, a transfer pass.  Within a pass every step
//! comes from the vehicle's [`VehicleStrategy`][tsim_strategy::VehicleStrategy]:
//!
//! | Step                   | Vehicle process                                          |
//! |------------------------|----------------------------------------------------------|
//! | `should_stop`          | take a node boarding slot, fill, drain, release          |
//! | `should_continue`      | acquire the edge (vehicle length), traverse, release     |
//! | `wait_time`            | wait after the move (or at the end of the pass)          |
//!
//! The event log receives `trip_start`, `entering`, `leaving`, `boarding`,
//! `offloading`, `*_pass_completion` and `trip_completion` lines through the
//! [`EventSink`][tsim_core::EventSink] given to the builder.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tsim_sim::{NoopObserver, SimBuilder};
//! use tsim_strategy::{DispatchKind, StrategyConfig, VehicleKind};
//!
//! let strategy = StrategyConfig::default();
//! let dispatch = DispatchKind::DemandProportional.build(&strategy)?;
//! let factory = VehicleKind::Evacuation.factory(&strategy)?;
//! let mut sim = SimBuilder::new(config, network, fleet, dispatch, factory).build()?;
//! let report = sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod observer;
pub mod sim;
pub mod stop;
mod vehicle;
pub mod world;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use dispatcher::Dispatcher;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{RunReport, Simulation};
pub use stop::StopHandle;
pub use world::World;
