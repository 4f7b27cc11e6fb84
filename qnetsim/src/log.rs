//! Per-station event logs.
//!
//! Each reported station may write one tab-separated line per event:
//!
//! ```text
//! jobId  eventType  timestamp  queueNonEmpty  queueLength
//! ```
//!
//! where `eventType` is [`EventKind::Arrival`] (1) or
//! [`EventKind::ServiceStart`] (0), the timestamp is expressed in model time
//! units and the queue fields describe the queue right after the event. Each
//! log starts with the header line `-1 0 0 0 0`.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::network::JobId;
use crate::time::units_from_duration;

/// Header line written at the top of every station log.
pub const LOG_HEADER: &str = "-1\t0\t0\t0\t0";

/// Kind of a logged event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A job from the generator entered the station queue.
    Arrival,
    /// A job left the queue and entered service.
    ServiceStart,
}

impl EventKind {
    /// Numeric code written in the log.
    pub fn code(self) -> u8 {
        match self {
            Self::Arrival => 1,
            Self::ServiceStart => 0,
        }
    }
}

/// Event stream of a single station.
///
/// Write errors are sticky: the first error is kept, later records are
/// dropped and the error is returned by [`finish()`](StationLog::finish).
pub struct StationLog {
    writer: Box<dyn Write>,
    error: Option<io::Error>,
    records: u64,
}

impl StationLog {
    /// Creates a log writing to an arbitrary sink and writes its header.
    pub fn new<W: Write + 'static>(writer: W) -> Self {
        let mut log = Self {
            writer: Box::new(writer),
            error: None,
            records: 0,
        };
        let header = writeln!(log.writer, "{LOG_HEADER}");
        log.keep_error(header);

        log
    }

    /// Creates (or truncates) a log file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;

        Ok(Self::new(BufWriter::new(file)))
    }

    /// Appends one event.
    pub fn record(&mut self, job: JobId, kind: EventKind, elapsed: Duration, queue_len: usize) {
        if self.error.is_some() {
            return;
        }
        let line = writeln!(
            self.writer,
            "{}\t{}\t{:.6}\t{}\t{}",
            job,
            kind.code(),
            units_from_duration(elapsed),
            u8::from(queue_len > 0),
            queue_len
        );
        if line.is_ok() {
            self.records += 1;
        }
        self.keep_error(line);
    }

    /// Number of events successfully handed to the writer.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Returns `true` if a write already failed.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Flushes the log and returns the first write error, if any.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        self.writer.flush()
    }

    fn keep_error(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

impl fmt::Debug for StationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationLog")
            .field("records", &self.records)
            .field("failed", &self.has_failed())
            .finish_non_exhaustive()
    }
}
