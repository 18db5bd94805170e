//! `tsim-core`: foundational types for the `tsim` fleet simulator.
//!
//! This crate is a dependency of every other `tsim-*` crate.  It intentionally
//! has no `tsim-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`ids`]     | `NodeId`, `EdgeId`, `RouteId`, `VehicleId`, kernel handles     |
//! | [`time`]    | `SimTime`, `SimConfig`                                        |
//! | [`rng`]     | `SimRng` (seeded, run-level)                                  |
//! | [`event`]   | `Event`, `PassKind`, `EventSink`, `EventBuffer`               |
//! | [`error`]   | `CoreError`, `CoreResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `SimConfig`.     |

pub mod error;
pub mod event;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use event::{Event, EventBuffer, EventSink, PassKind};
pub use ids::{EdgeId, GuardId, LatchId, NodeId, ProcessId, RouteId, VehicleId};
pub use rng::SimRng;
pub use time::{SimConfig, SimTime};
