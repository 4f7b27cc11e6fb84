//! Simulation time and suspension primitives.
//!
//! This module provides most notably:
//!
//! * [`MonotonicTime`]: the timestamp type used for virtual time, re-exported
//!   from the [`tai_time`] crate; simulations start at
//!   [`MonotonicTime::EPOCH`] and one model time unit is one second,
//! * [`Scheduler`]: a handle to the simulation clock giving logical threads
//!   access to the current time and to timed suspension with
//!   [`Scheduler::after()`],
//! * [`Signal`]: a single-slot wake signal on which a logical thread can park
//!   indefinitely until another logical thread interrupts it.
//!
//! # Examples
//!
//! A logical thread that ticks every 2 time units until it is interrupted by
//! another thread.
//!
//! ```
//! use std::time::Duration;
//!
//! use qnetsim::simulation::Simulation;
//! use qnetsim::time::{MonotonicTime, Signal};
//!
//! let mut simu = Simulation::new();
//! let scheduler = simu.scheduler().clone();
//! let signal = Signal::new();
//!
//! simu.spawn({
//!     let signal = signal.clone();
//!     async move {
//!         // Park until interrupted, with no timer armed.
//!         signal.wait().await;
//!         println!("woken at {:?}", scheduler.elapsed());
//!     }
//! });
//! simu.spawn({
//!     let scheduler = simu.scheduler().clone();
//!     async move {
//!         scheduler.after(Duration::from_secs(2)).await;
//!         signal.interrupt();
//!     }
//! });
//!
//! simu.run_until(MonotonicTime::EPOCH + Duration::from_secs(10)).unwrap();
//! ```

mod scheduler;
mod signal;

pub use tai_time::MonotonicTime;

pub use scheduler::{Scheduler, SchedulingError, Sleep};
pub use signal::{Signal, WaitForSignal};

use std::time::Duration;

/// Converts a duration expressed in model time units into a [`Duration`].
///
/// Negative, non-finite or out-of-range values saturate: negative values and
/// NaN map to zero and values too large for a `Duration` to [`Duration::MAX`].
pub fn duration_from_units(units: f64) -> Duration {
    if units.is_nan() || units <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(units).unwrap_or(Duration::MAX)
}

/// Converts a [`Duration`] into model time units.
pub fn units_from_duration(duration: Duration) -> f64 {
    duration.as_secs_f64()
}
