//! SQLite output backend (feature `sqlite`).
//!
//! One `events` table, one row per event, `seq` preserving log order.
//! Rows are buffered and inserted in batches of [`BATCH`] inside a single
//! transaction.

use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use tsim_core::Event;

use crate::row::EventRow;
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Rows held in memory before a flush.
pub const BATCH: usize = 1024;

/// Writes the event log to an SQLite database.
pub struct SqliteEventWriter {
    conn:     Connection,
    pending:  Vec<EventRow>,
    finished: bool,
}

impl SqliteEventWriter {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn new(path: impl AsRef<Path>) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS events (
                 seq     INTEGER PRIMARY KEY AUTOINCREMENT,
                 route   INTEGER NOT NULL,
                 vehicle INTEGER NOT NULL,
                 tag     TEXT    NOT NULL,
                 at      REAL    NOT NULL,
                 trip    INTEGER,
                 pass    TEXT,
                 from_node INTEGER,
                 to_node INTEGER,
                 length  REAL,
                 count   INTEGER,
                 dest    INTEGER,
                 node    INTEGER
             );",
        )?;

        Ok(Self { conn, pending: Vec::with_capacity(BATCH), finished: false })
    }

    fn flush(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events \
                 (route, vehicle, tag, at, trip, pass, from_node, to_node, length, count, dest, node) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for row in &self.pending {
                stmt.execute(rusqlite::params![
                    row.route,
                    row.vehicle,
                    row.tag,
                    row.at,
                    row.trip,
                    row.pass,
                    row.from,
                    row.to,
                    row.length,
                    row.count,
                    row.dest,
                    row.node,
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = self.pending.len(), "sqlite batch committed");
        self.pending.clear();
        Ok(())
    }
}

impl OutputWriter for SqliteEventWriter {
    fn write_event(&mut self, event: &Event) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.pending.push(EventRow::from(event));
        if self.pending.len() >= BATCH {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.flush()?;
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
