//! `EventLogSink<W>`: bridges `EventSink` to an `OutputWriter`.

use tracing::{debug, warn};

use tsim_core::{Event, EventSink};

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// An [`EventSink`] that forwards every event to an [`OutputWriter`].
///
/// `EventSink::record` has no return value, so the first write error is
/// stored and later events are dropped.  After the run, call
/// [`finish`][Self::finish] (which reports a stored error) or inspect
/// [`take_error`][Self::take_error].
pub struct EventLogSink<W: OutputWriter> {
    writer:     W,
    written:    u64,
    dropped:    u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> EventLogSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0, dropped: 0, last_error: None }
    }

    /// Events successfully handed to the writer.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Events discarded after the first error.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Take the stored write error, if any.
    ///
    /// Returns `None` if all writes succeeded.  Taking the error does not
    /// resume writing.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the writer.  Reports the stored write error first, if there is one.
    pub fn finish(&mut self) -> OutputResult<()> {
        let flushed = self.writer.finish();
        if let Some(e) = self.last_error.take() {
            return Err(e);
        }
        flushed?;
        debug!(written = self.written, "event log finished");
        Ok(())
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Unwrap the inner writer (e.g. to inspect its output after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: OutputWriter> EventSink for EventLogSink<W> {
    fn record(&mut self, event: &Event) {
        if self.last_error.is_some() || self.dropped > 0 {
            self.dropped += 1;
            return;
        }
        match self.writer.write_event(event) {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!(error = %e, "event log write failed; dropping further events");
                self.last_error = Some(e);
                self.dropped += 1;
            }
        }
    }
}
