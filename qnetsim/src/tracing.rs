//! Support for structured logging.
//!
//! # Overview
//!
//! Stations and job generators emit [`tracing`] events: `trace` for every job
//! movement, `debug` for station state changes and `info`/`warn` for the
//! progress of replicates. By default, the
//! [`tracing_subscriber::fmt`][mod@tracing_subscriber::fmt] subscriber stamps
//! events with the wall clock time, which says little about what happened
//! inside a simulation. This module provides a [`SimulationTime`] timer that
//! stamps events emitted while a simulation is running with the simulation
//! time, expressed in model time units.
//!
//! # Configuration
//!
//! ```
//! use qnetsim::tracing::SimulationTime;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
//!     .with_timer(SimulationTime::with_system_timer())
//!     .init();
//! ```
//!
//! Events emitted outside a running simulation, such as replicate summaries,
//! fall back to the system timer:
//!
//! ```text
//! [t=12.041316] TRACE qnetsim::network::station: service started station=cpu job=17 service_time=0.0321
//! 2026-10-18T09:12:44.101384Z  INFO qnetsim::replication: replicate completed replicate=0 seed=6917134620364413219 jobs_generated=996
//! ```
//!
//! `SimulationTime::with_system_timer_always()` prepends the system time to
//! simulation events as well.
//!
//! Any other [`FormatTime`] implementation can stand in for the system timer,
//! e.g. the time elapsed since the program started:
//!
//! ```
//! use qnetsim::tracing::SimulationTime;
//! use tracing_subscriber::fmt::time::Uptime;
//!
//! tracing_subscriber::fmt()
//!     .with_timer(SimulationTime::with_custom_timer_always(Uptime::default()))
//!     .init();
//! ```
//!
//! # Event filtering examples
//!
//! Filtering on the `RUST_LOG` variable requires the `env-filter` feature of
//! [`tracing-subscriber`][tracing_subscriber]. To follow every job movement
//! in a single replicate:
//!
//! ```text
//! $ RUST_LOG="info,qnetsim::network=trace" qnetsim --replicates 1
//! ```

use std::fmt;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};

use crate::simulation::current_elapsed;
use crate::time::units_from_duration;

/// A timer for [`tracing-subscriber`][tracing_subscriber] stamping events with
/// the simulation time instead of (or on top of) the wall clock time.
///
/// See the [module-level documentation][crate::tracing] for more details.
#[derive(Default, Debug)]
pub struct SimulationTime<const VERBOSE: bool, T> {
    sys_timer: T,
}

impl SimulationTime<false, SystemTime> {
    /// Constructs a simulation timer which falls back to the [`SystemTime`]
    /// timer for events emitted outside a simulation.
    pub fn with_system_timer() -> Self {
        Self::default()
    }
}

impl SimulationTime<true, SystemTime> {
    /// Constructs a simulation timer which prepends a [`SystemTime`] timestamp
    /// to all events, followed by the simulation time for simulation events.
    pub fn with_system_timer_always() -> Self {
        Self::default()
    }
}

impl<T: FormatTime> SimulationTime<false, T> {
    /// Constructs a simulation timer which falls back to the provided timer
    /// for events emitted outside a simulation.
    pub fn with_custom_timer(sys_timer: T) -> Self {
        Self { sys_timer }
    }
}

impl<T: FormatTime> SimulationTime<true, T> {
    /// Constructs a simulation timer which prepends a timestamp generated with
    /// the provided timer to all events, followed by the simulation time for
    /// simulation events.
    pub fn with_custom_timer_always(sys_timer: T) -> Self {
        Self { sys_timer }
    }
}

impl<const VERBOSE: bool, T: FormatTime> FormatTime for SimulationTime<VERBOSE, T> {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        match current_elapsed() {
            Some(elapsed) => {
                if VERBOSE {
                    self.sys_timer.format_time(w)?;
                    w.write_char(' ')?;
                }
                write!(w, "[t={:.6}]", units_from_duration(elapsed))
            }
            None => self.sys_timer.format_time(w),
        }
    }
}
