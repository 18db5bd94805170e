//! Flat row form of an [`Event`], shared by the tabular backends.

use tsim_core::Event;

/// Column names, in the order [`EventRow::record`] emits them.
pub const COLUMNS: [&str; 12] =
    ["route", "vehicle", "tag", "at", "trip", "pass", "from", "to", "length", "count", "dest", "node"];

/// One event with every field pulled out into its own column.
///
/// Fields an event does not carry are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRow {
    pub route:   u32,
    pub vehicle: u32,
    pub tag:     &'static str,
    pub at:      f64,
    pub trip:    Option<u32>,
    pub pass:    Option<&'static str>,
    pub from:    Option<u32>,
    pub to:      Option<u32>,
    pub length:  Option<f64>,
    pub count:   Option<u32>,
    pub dest:    Option<u32>,
    /// Node where passengers boarded or were offloaded.
    pub node:    Option<u32>,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        let mut row = EventRow {
            route:   event.route().0,
            vehicle: event.vehicle().0,
            tag:     event.tag(),
            at:      event.at().0,
            trip:    None,
            pass:    None,
            from:    None,
            to:      None,
            length:  None,
            count:   None,
            dest:    None,
            node:    None,
        };
        match *event {
            Event::TripStart { trip, .. } | Event::TripCompletion { trip, .. } => row.trip = Some(trip),
            Event::PassCompletion { pass, .. } => row.pass = Some(pass.as_str()),
            Event::Entering { from, to, length, .. } | Event::Leaving { from, to, length, .. } => {
                row.from = Some(from.0);
                row.to = Some(to.0);
                row.length = Some(length);
            }
            Event::Boarding { count, dest, node, .. } => {
                row.count = Some(count);
                row.dest = Some(dest.0);
                row.node = Some(node.0);
            }
            Event::Offloading { count, node, .. } => {
                row.count = Some(count);
                row.node = Some(node.0);
            }
        }
        row
    }
}

impl EventRow {
    /// The row as text fields in [`COLUMNS`] order; absent fields are empty.
    pub fn record(&self) -> [String; 12] {
        fn opt<T: ToString>(v: Option<T>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }
        [
            self.route.to_string(),
            self.vehicle.to_string(),
            self.tag.to_owned(),
            self.at.to_string(),
            opt(self.trip),
            opt(self.pass),
            opt(self.from),
            opt(self.to),
            opt(self.length),
            opt(self.count),
            opt(self.dest),
            opt(self.node),
        ]
    }
}
