//! The plain-text event log: one `Display`-rendered event per line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tsim_core::Event;

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Writes the line-oriented event log to any `Write`.
pub struct TextLogWriter<W: Write> {
    out:      W,
    lines:    u64,
    finished: bool,
}

impl TextLogWriter<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TextLogWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0, finished: false }
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputWriter for TextLogWriter<W> {
    fn write_event(&mut self, event: &Event) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        writeln!(self.out, "{event}")?;
        self.lines += 1;
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
