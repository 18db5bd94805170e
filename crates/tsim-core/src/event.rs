//! Simulation event records and the sink they are written to.
//!
//! Every observable thing a vehicle does (starting a trip, entering or
//! leaving an edge, boarding, offloading) becomes one [`Event`].  Events are
//! rendered as single lines of text whose format is a stable contract with
//! downstream analytics:
//!
//! ```text
//! route 0 vehicle 3 trip_start 1 at 120
//! route 0 vehicle 3 boarding 5 passenger for 4 from 0 at 120
//! route 0 vehicle 3 entering edge 0,1 of length 100 at 120
//! route 0 vehicle 3 leaving edge 0,1 of length 100 at 130
//! route 0 vehicle 3 offloading 5 passenger for 4 at 131.5
//! route 0 vehicle 3 forward_pass_completion at 131.5
//! route 0 vehicle 3 trip_completion 1 at 260
//! ```
//!
//! [`Event`] implements both `Display` and `FromStr`, so a log written by one
//! run can be parsed back losslessly.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, NodeId, RouteId, SimTime, VehicleId};

// ── PassKind ──────────────────────────────────────────────────────────────────

/// Directional leg of a trip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PassKind {
    Forward,
    Backward,
    Transfer,
}

impl PassKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PassKind::Forward => "forward",
            PassKind::Backward => "backward",
            PassKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// One line of the event log.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    TripStart {
        route:   RouteId,
        vehicle: VehicleId,
        trip:    u32,
        at:      SimTime,
    },
    PassCompletion {
        route:   RouteId,
        vehicle: VehicleId,
        pass:    PassKind,
        at:      SimTime,
    },
    TripCompletion {
        route:   RouteId,
        vehicle: VehicleId,
        trip:    u32,
        at:      SimTime,
    },
    Entering {
        route:   RouteId,
        vehicle: VehicleId,
        from:    NodeId,
        to:      NodeId,
        length:  f64,
        at:      SimTime,
    },
    Leaving {
        route:   RouteId,
        vehicle: VehicleId,
        from:    NodeId,
        to:      NodeId,
        length:  f64,
        at:      SimTime,
    },
    Boarding {
        route:   RouteId,
        vehicle: VehicleId,
        count:   u32,
        dest:    NodeId,
        node:    NodeId,
        at:      SimTime,
    },
    Offloading {
        route:   RouteId,
        vehicle: VehicleId,
        count:   u32,
        node:    NodeId,
        at:      SimTime,
    },
}

impl Event {
    pub fn route(&self) -> RouteId {
        match *self {
            Event::TripStart { route, .. }
            | Event::PassCompletion { route, .. }
            | Event::TripCompletion { route, .. }
            | Event::Entering { route, .. }
            | Event::Leaving { route, .. }
            | Event::Boarding { route, .. }
            | Event::Offloading { route, .. } => route,
        }
    }

    pub fn vehicle(&self) -> VehicleId {
        match *self {
            Event::TripStart { vehicle, .. }
            | Event::PassCompletion { vehicle, .. }
            | Event::TripCompletion { vehicle, .. }
            | Event::Entering { vehicle, .. }
            | Event::Leaving { vehicle, .. }
            | Event::Boarding { vehicle, .. }
            | Event::Offloading { vehicle, .. } => vehicle,
        }
    }

    pub fn at(&self) -> SimTime {
        match *self {
            Event::TripStart { at, .. }
            | Event::PassCompletion { at, .. }
            | Event::TripCompletion { at, .. }
            | Event::Entering { at, .. }
            | Event::Leaving { at, .. }
            | Event::Boarding { at, .. }
            | Event::Offloading { at, .. } => at,
        }
    }

    /// The event tag as it appears in the log line.
    pub fn tag(&self) -> &'static str {
        match self {
            Event::TripStart { .. } => "trip_start",
            Event::PassCompletion { pass: PassKind::Forward, .. } => "forward_pass_completion",
            Event::PassCompletion { pass: PassKind::Backward, .. } => "backward_pass_completion",
            Event::PassCompletion { pass: PassKind::Transfer, .. } => "transfer_pass_completion",
            Event::TripCompletion { .. } => "trip_completion",
            Event::Entering { .. } => "entering",
            Event::Leaving { .. } => "leaving",
            Event::Boarding { .. } => "boarding",
            Event::Offloading { .. } => "offloading",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route {} vehicle {} {}", self.route().0, self.vehicle().0, self.tag())?;
        match self {
            Event::TripStart { trip, at, .. } | Event::TripCompletion { trip, at, .. } => {
                write!(f, " {trip} at {at}")
            }
            Event::PassCompletion { at, .. } => write!(f, " at {at}"),
            Event::Entering { from, to, length, at, .. }
            | Event::Leaving { from, to, length, at, .. } => {
                write!(f, " edge {},{} of length {length} at {at}", from.0, to.0)
            }
            Event::Boarding { count, dest, node, at, .. } => {
                write!(f, " {count} passenger for {} from {} at {at}", dest.0, node.0)
            }
            Event::Offloading { count, node, at, .. } => {
                write!(f, " {count} passenger for {} at {at}", node.0)
            }
        }
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

struct Tokens<'a> {
    line: &'a str,
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Tokens { line, iter: line.split_whitespace() }
    }

    fn err(&self, what: &str) -> CoreError {
        CoreError::Parse(format!("{what} in {:?}", self.line))
    }

    fn next(&mut self, what: &str) -> Result<&'a str, CoreError> {
        self.iter.next().ok_or_else(|| self.err(&format!("missing {what}")))
    }

    fn keyword(&mut self, kw: &str) -> Result<(), CoreError> {
        let tok = self.next(kw)?;
        if tok == kw { Ok(()) } else { Err(self.err(&format!("expected `{kw}`, found `{tok}`"))) }
    }

    fn number<T: FromStr>(&mut self, what: &str) -> Result<T, CoreError> {
        let tok = self.next(what)?;
        tok.parse().map_err(|_| self.err(&format!("bad {what} `{tok}`")))
    }

    fn time(&mut self) -> Result<SimTime, CoreError> {
        self.keyword("at")?;
        self.number::<f64>("timestamp").map(SimTime)
    }

    fn end(&mut self) -> Result<(), CoreError> {
        match self.iter.next() {
            None => Ok(()),
            Some(tok) => Err(self.err(&format!("trailing `{tok}`"))),
        }
    }
}

impl FromStr for Event {
    type Err = CoreError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut t = Tokens::new(line);
        t.keyword("route")?;
        let route = RouteId(t.number("route id")?);
        t.keyword("vehicle")?;
        let vehicle = VehicleId(t.number("vehicle id")?);
        let tag = t.next("event tag")?;

        let event = match tag {
            "trip_start" | "trip_completion" => {
                let trip = t.number("trip number")?;
                let at = t.time()?;
                if tag == "trip_start" {
                    Event::TripStart { route, vehicle, trip, at }
                } else {
                    Event::TripCompletion { route, vehicle, trip, at }
                }
            }
            "forward_pass_completion" | "backward_pass_completion" | "transfer_pass_completion" => {
                let pass = match tag {
                    "forward_pass_completion" => PassKind::Forward,
                    "backward_pass_completion" => PassKind::Backward,
                    _ => PassKind::Transfer,
                };
                Event::PassCompletion { route, vehicle, pass, at: t.time()? }
            }
            "entering" | "leaving" => {
                t.keyword("edge")?;
                let pair = t.next("edge endpoints")?;
                let (a, b) = pair
                    .split_once(',')
                    .ok_or_else(|| t.err(&format!("bad edge endpoints `{pair}`")))?;
                let from = a.parse().map(NodeId).map_err(|_| t.err("bad edge source"))?;
                let to = b.parse().map(NodeId).map_err(|_| t.err("bad edge target"))?;
                t.keyword("of")?;
                t.keyword("length")?;
                let length = t.number("edge length")?;
                let at = t.time()?;
                if tag == "entering" {
                    Event::Entering { route, vehicle, from, to, length, at }
                } else {
                    Event::Leaving { route, vehicle, from, to, length, at }
                }
            }
            "boarding" => {
                let count = t.number("passenger count")?;
                t.keyword("passenger")?;
                t.keyword("for")?;
                let dest = NodeId(t.number("destination")?);
                t.keyword("from")?;
                let node = NodeId(t.number("node")?);
                Event::Boarding { route, vehicle, count, dest, node, at: t.time()? }
            }
            "offloading" => {
                let count = t.number("passenger count")?;
                t.keyword("passenger")?;
                t.keyword("for")?;
                let node = NodeId(t.number("node")?);
                Event::Offloading { route, vehicle, count, node, at: t.time()? }
            }
            other => return Err(t.err(&format!("unknown event tag `{other}`"))),
        };
        t.end()?;
        Ok(event)
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Destination for simulation events.
///
/// The simulation calls `record` once per event, in the exact order events
/// occur.  Implementations that can fail (file writers) must hold on to the
/// error themselves; the simulation loop does not stop for sink failures.
pub trait EventSink {
    fn record(&mut self, event: &Event);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &Event) {
        (**self).record(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&mut self, event: &Event) {
        (**self).record(event);
    }
}

/// In-memory sink used by tests and by hosts that post-process a run.
#[derive(Clone, Debug, Default)]
pub struct EventBuffer {
    events: Vec<Event>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render every event as a log line.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl EventSink for EventBuffer {
    fn record(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}
