//! Error types of a simulation run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::time::SchedulingError;

/// Error returned when a run cannot be completed.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The log directory or a log file could not be created.
    #[error("cannot create station log `{}`", .path.display())]
    LogDir {
        /// Path of the directory or file.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },
    /// A station log could not be written; the replicate was aborted.
    #[error("replicate {replicate}: cannot write the log of station `{station}` (aborted at t={time})")]
    Log {
        /// Index of the aborted replicate.
        replicate: usize,
        /// Station name.
        station: String,
        /// Simulation time at which the replicate stopped.
        time: f64,
        /// Cause.
        #[source]
        source: io::Error,
    },
    /// The simulation clock was driven backward.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    /// The report could not be serialized.
    #[error("cannot serialize the report")]
    Report(#[from] serde_json::Error),
}
