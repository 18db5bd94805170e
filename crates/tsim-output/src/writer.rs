//! The `OutputWriter` trait implemented by all backend writers.

use tsim_core::Event;

use crate::OutputResult;

/// Trait implemented by the text, CSV, and SQLite writers.
///
/// Events arrive in log order.  Writing after [`finish`](Self::finish) is an
/// error ([`OutputError::Finished`](crate::OutputError::Finished)).
pub trait OutputWriter {
    /// Append one event.
    fn write_event(&mut self, event: &Event) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

impl<W: OutputWriter + ?Sized> OutputWriter for &mut W {
    fn write_event(&mut self, event: &Event) -> OutputResult<()> {
        (**self).write_event(event)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}

impl<W: OutputWriter + ?Sized> OutputWriter for Box<W> {
    fn write_event(&mut self, event: &Event) -> OutputResult<()> {
        (**self).write_event(event)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}

/// Sends every event to several writers in turn.
///
/// Stops at the first writer that fails; later writers do not see the event.
#[derive(Default)]
pub struct Fanout {
    writers: Vec<Box<dyn OutputWriter>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, writer: impl OutputWriter + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }

    pub fn push(&mut self, writer: Box<dyn OutputWriter>) {
        self.writers.push(writer);
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl OutputWriter for Fanout {
    fn write_event(&mut self, event: &Event) -> OutputResult<()> {
        self.writers.iter_mut().try_for_each(|w| w.write_event(event))
    }

    /// Finishes every writer, even after one fails; returns the first error.
    fn finish(&mut self) -> OutputResult<()> {
        let mut first = None;
        for w in &mut self.writers {
            if let Err(e) = w.finish() {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
