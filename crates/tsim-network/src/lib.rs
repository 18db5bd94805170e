//! `tsim-network`: the entity graph and fleet registry.
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`primitive`] | `Node` (demand pool), `Edge`, `Route`                       |
//! | [`network`]   | `Network` aggregate, `NetworkBuilder` with validation       |
//! | [`fleet`]     | `Vehicle` (manifest, trip count), `Fleet`, `FleetBuilder`   |
//! | [`desk`]      | `BoardingDesk`: the only path that decreases node demand    |
//! | [`loader`]    | whitespace text loaders for matrices, routes, and fleets    |
//! | [`error`]     | `NetworkError`, `NetworkResult`                             |
//!
//! # Mutation rules
//!
//! After [`NetworkBuilder::build`] the graph is frozen.  Node demand can only
//! go down, and only through [`BoardingDesk::drain`], which clamps every
//! request to what is waiting.  A vehicle's manifest only changes through
//! [`BoardingDesk::board`] and [`BoardingDesk::offload`], which clamp to its
//! free seats.

pub mod desk;
pub mod error;
pub mod fleet;
pub mod loader;
pub mod network;
pub mod primitive;


pub use desk::BoardingDesk;
pub use error::{NetworkError, NetworkResult};
pub use fleet::{Fleet, FleetBuilder, Vehicle};
pub use loader::{InputFiles, Source, load_fleet, load_network};
pub use network::{Network, NetworkBuilder};
pub use primitive::{Edge, Node, Route};
