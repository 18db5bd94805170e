//! CSV output backend.
//!
//! Header: `route,vehicle,tag,at,trip,pass,from,to,length,count,dest,node`.
//! Columns an event does not carry are left empty.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use tsim_core::Event;

use crate::row::{COLUMNS, EventRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Writes one CSV row per event.
pub struct CsvEventWriter<W: Write> {
    out:      Writer<W>,
    finished: bool,
}

impl CsvEventWriter<File> {
    /// Create (or truncate) the CSV file at `path` and write its header.
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        Self::from_csv(Writer::from_path(path)?)
    }
}

impl<W: Write> CsvEventWriter<W> {
    /// Wrap any `Write` and write the header row.
    pub fn new(out: W) -> OutputResult<Self> {
        Self::from_csv(Writer::from_writer(out))
    }

    fn from_csv(mut out: Writer<W>) -> OutputResult<Self> {
        out.write_record(COLUMNS)?;
        Ok(Self { out, finished: false })
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> OutputResult<W> {
        self.out.into_inner().map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write> OutputWriter for CsvEventWriter<W> {
    fn write_event(&mut self, event: &Event) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.out.write_record(EventRow::from(event).record())?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.finished {
            self.out.flush()?;
            self.finished = true;
        }
        Ok(())
    }
}
