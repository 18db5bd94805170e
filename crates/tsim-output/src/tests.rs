//! Unit tests for tsim-output.

#[cfg(test)]
mod fixtures {
    use tsim_core::{Event, NodeId, PassKind, RouteId, SimTime, VehicleId};

    pub fn events() -> Vec<Event> {
        let (route, vehicle) = (RouteId(2), VehicleId(7));
        vec![
            Event::TripStart { route, vehicle, trip: 0, at: SimTime(0.0) },
            Event::Boarding { route, vehicle, count: 5, dest: NodeId(3), node: NodeId(0), at: SimTime(0.0) },
            Event::Entering { route, vehicle, from: NodeId(0), to: NodeId(1), length: 100.0, at: SimTime(1.5) },
            Event::Leaving { route, vehicle, from: NodeId(0), to: NodeId(1), length: 100.0, at: SimTime(11.5) },
            Event::Offloading { route, vehicle, count: 5, node: NodeId(1), at: SimTime(11.5) },
            Event::PassCompletion { route, vehicle, pass: PassKind::Forward, at: SimTime(11.5) },
            Event::TripCompletion { route, vehicle, trip: 1, at: SimTime(23.0) },
        ]
    }
}

#[cfg(test)]
mod text_tests {
    use tsim_core::Event;

    use super::fixtures::events;
    use crate::text::TextLogWriter;
    use crate::writer::OutputWriter;
    use crate::OutputError;

    #[test]
    fn one_display_line_per_event() {
        let mut w = TextLogWriter::new(Vec::new());
        for e in &events() {
            w.write_event(e).unwrap();
        }
        w.finish().unwrap();
        assert_eq!(w.lines(), 7);

        let text = String::from_utf8(w.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "route 2 vehicle 7 trip_start 0 at 0");
        assert_eq!(lines[1], "route 2 vehicle 7 boarding 5 passenger for 3 from 0 at 0");
        assert_eq!(lines[2], "route 2 vehicle 7 entering edge 0,1 of length 100 at 1.5");
        assert_eq!(lines[4], "route 2 vehicle 7 offloading 5 passenger for 1 at 11.5");
        assert_eq!(lines[6], "route 2 vehicle 7 trip_completion 1 at 23");
    }

    #[test]
    fn file_parses_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("event_log.txt");
        let mut w = TextLogWriter::create(&path).unwrap();
        for e in &events() {
            w.write_event(e).unwrap();
        }
        w.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Event> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(parsed, events());
    }

    #[test]
    fn finish_is_idempotent_and_final() {
        let mut w = TextLogWriter::new(Vec::new());
        w.finish().unwrap();
        w.finish().unwrap();
        let err = w.write_event(&events()[0]).unwrap_err();
        assert!(matches!(err, OutputError::Finished));
    }
}

#[cfg(test)]
mod csv_tests {
    use super::fixtures::events;
    use crate::csv::CsvEventWriter;
    use crate::row::COLUMNS;
    use crate::writer::OutputWriter;

    #[test]
    fn header_then_one_row_per_event() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("events.csv");
        let mut w = CsvEventWriter::create(&path).unwrap();
        for e in &events() {
            w.write_event(e).unwrap();
        }
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, COLUMNS);
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 7);
    }

    #[test]
    fn absent_fields_are_empty() {
        let mut w = CsvEventWriter::new(Vec::new()).unwrap();
        for e in &events() {
            w.write_event(e).unwrap();
        }
        let bytes = w.into_inner().unwrap();

        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();

        // route,vehicle,tag,at,trip,pass,from,to,length,count,dest,node
        let boarding = &rows[1];
        assert_eq!(&boarding[2], "boarding");
        assert_eq!(&boarding[4], "");
        assert_eq!(&boarding[9], "5");
        assert_eq!(&boarding[10], "3");
        assert_eq!(&boarding[11], "0");

        let entering = &rows[2];
        assert_eq!(&entering[3], "1.5");
        assert_eq!(&entering[6], "0");
        assert_eq!(&entering[7], "1");
        assert_eq!(&entering[8], "100");
        assert_eq!(&entering[9], "");

        let pass = &rows[5];
        assert_eq!(&pass[2], "forward_pass_completion");
        assert_eq!(&pass[5], "forward");
    }
}

#[cfg(test)]
mod sink_tests {
    use std::io;

    use tsim_core::{Event, EventSink};

    use super::fixtures::events;
    use crate::sink::EventLogSink;
    use crate::text::TextLogWriter;
    use crate::writer::{Fanout, OutputWriter};
    use crate::{OutputError, OutputResult};

    /// Accepts `budget` events, then fails every write.
    struct Flaky {
        budget:   usize,
        attempts: usize,
        finished: bool,
    }

    impl OutputWriter for Flaky {
        fn write_event(&mut self, _event: &Event) -> OutputResult<()> {
            self.attempts += 1;
            if self.attempts > self.budget {
                return Err(OutputError::Io(io::Error::other("disk full")));
            }
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn forwards_every_event() {
        let mut sink = EventLogSink::new(TextLogWriter::new(Vec::new()));
        for e in &events() {
            sink.record(e);
        }
        sink.finish().unwrap();
        assert_eq!(sink.written(), 7);
        assert!(sink.take_error().is_none());
        let text = String::from_utf8(sink.into_writer().into_inner()).unwrap();
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn first_error_is_kept_and_later_events_dropped() {
        let mut sink = EventLogSink::new(Flaky { budget: 2, attempts: 0, finished: false });
        for e in &events() {
            sink.record(e);
        }
        assert_eq!(sink.written(), 2);
        assert_eq!(sink.dropped(), 5);
        // The writer is not retried once it has failed.
        assert_eq!(sink.writer().attempts, 3);

        let err = sink.finish().unwrap_err();
        assert!(matches!(err, OutputError::Io(_)));
        assert!(sink.writer().finished);
        assert!(sink.take_error().is_none());
    }

    #[test]
    fn fanout_feeds_every_writer() {
        let mut fan = Fanout::new().with(TextLogWriter::new(Vec::new())).with(TextLogWriter::new(Vec::new()));
        assert_eq!(fan.len(), 2);
        let mut sink = EventLogSink::new(&mut fan);
        for e in &events() {
            sink.record(e);
        }
        sink.finish().unwrap();
        assert_eq!(sink.written(), 7);
    }

    #[test]
    fn fanout_finishes_all_and_reports_first_failure() {
        struct FailsOnFinish;
        impl OutputWriter for FailsOnFinish {
            fn write_event(&mut self, _event: &Event) -> OutputResult<()> {
                Ok(())
            }
            fn finish(&mut self) -> OutputResult<()> {
                Err(OutputError::Io(io::Error::other("close failed")))
            }
        }

        let mut fan = Fanout::new().with(FailsOnFinish).with(TextLogWriter::new(Vec::new()));
        assert!(fan.finish().is_err());
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::fixtures::events;
    use crate::sqlite::{BATCH, SqliteEventWriter};
    use crate::writer::OutputWriter;

    #[test]
    fn rows_keep_log_order() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("events.db");
        let mut w = SqliteEventWriter::new(&path).unwrap();
        for e in &events() {
            w.write_event(e).unwrap();
        }
        w.finish().unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(&path).unwrap();
        let tags: Vec<String> = conn
            .prepare("SELECT tag FROM events ORDER BY seq")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(tags, ["trip_start", "boarding", "entering", "leaving", "offloading", "forward_pass_completion", "trip_completion"]);

        let (count, dest, trip): (Option<u32>, Option<u32>, Option<u32>) = conn
            .query_row("SELECT count, dest, trip FROM events WHERE tag = 'boarding'", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!((count, dest, trip), (Some(5), Some(3), None));
    }

    #[test]
    fn large_logs_flush_in_batches() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("events.db");
        let mut w = SqliteEventWriter::new(&path).unwrap();
        let e = &events()[2];
        for _ in 0..BATCH + 10 {
            w.write_event(e).unwrap();
        }
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(&path).unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0)).unwrap();
        assert_eq!(n as usize, BATCH + 10);
    }
}
