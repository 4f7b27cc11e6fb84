//! Jobs flowing through the network.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::time::MonotonicTime;

/// Identity of a job.
///
/// Identities are assigned by the job generator in production order, starting
/// at 0, and are kept unchanged when a job is routed to another station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A job waiting in the queue of a station.
///
/// A job record belongs to exactly one queue. Routing a job downstream creates
/// a new record with the same identity, stamped with the departure time.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    /// Job identity.
    pub id: JobId,
    /// Time at which the job entered its current queue.
    pub arrival_time: MonotonicTime,
    /// Service demand at the station holding the job.
    pub service_time: Duration,
}

impl Job {
    /// Creates a job record.
    pub fn new(id: JobId, arrival_time: MonotonicTime, service_time: Duration) -> Self {
        Self {
            id,
            arrival_time,
            service_time,
        }
    }
}
