//! `tsim-output`: event log writers for the `tsim` fleet simulator.
//!
//! Three backends, one per destination format:
//!
//! | Feature   | Writer                | Output                                     |
//! |-----------|-----------------------|--------------------------------------------|
//! | *(none)*  | [`TextLogWriter`]     | the line-oriented log, one event per line  |
//! | *(none)*  | [`CsvEventWriter`]    | one row per event, one column per field    |
//! | `sqlite`  | `SqliteEventWriter`   | an `events` table                          |
//!
//! All writers implement [`OutputWriter`].  [`EventLogSink`] adapts any of
//! them to `tsim_core::EventSink` so it can be handed straight to the
//! simulation builder.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tsim_output::{EventLogSink, TextLogWriter};
//!
//! let sink = EventLogSink::new(TextLogWriter::create("event_log.txt")?);
//! let mut sim = SimBuilder::new(config, network, fleet, dispatch, factory)
//!     .event_sink(sink)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! let mut sink = sim.into_sink();
//! sink.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod row;
pub mod sink;
pub mod text;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use crate::csv::CsvEventWriter;
pub use error::{OutputError, OutputResult};
pub use row::EventRow;
pub use sink::EventLogSink;
pub use text::TextLogWriter;
pub use writer::{Fanout, OutputWriter};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEventWriter;
