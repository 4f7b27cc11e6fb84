//! Discrete-event simulation management.
//!
//! This module contains the [`Simulation`] environment, which owns the
//! simulation clock and the executor running all logical threads.
//!
//! # Simulation lifecycle
//!
//! 1. a [`Simulation`] is created with [`Simulation::new()`]; its clock starts
//!    at [`MonotonicTime::EPOCH`],
//! 2. logical threads are spawned with [`Simulation::spawn()`]; they receive a
//!    clone of the [`Scheduler`] handle returned by
//!    [`Simulation::scheduler()`] to read the time and suspend themselves,
//! 3. the simulation is run up to a horizon with
//!    [`Simulation::run_until()`] or [`Simulation::run_for()`].
//!
//! # Ordering guarantees
//!
//! A call to `run_until()` repeatedly
//!
//! 1. polls every logical thread that is ready, including threads made ready
//!    by a [`Signal`](crate::time::Signal) interrupt while polling others,
//! 2. pulls the earliest pending timed wake-up, advances the clock to its time
//!    and wakes the corresponding thread.
//!
//! Wake-ups armed for the same time are pulled in the order in which they were
//! armed, so a simulation is a deterministic function of the order in which
//! its threads were spawned and of the random streams they draw from.
//!
//! Only wake-ups scheduled strictly before the horizon are processed. Later
//! wake-ups stay pending and are discarded together with the simulation.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::trace;

use crate::executor::Executor;
use crate::time::{MonotonicTime, Scheduler, SchedulingError};

thread_local! {
    /// Clock of the simulation currently running on this thread, if any.
    static CURRENT_SCHEDULER: RefCell<Option<Scheduler>> = const { RefCell::new(None) };
}

/// Returns the time elapsed in the simulation currently running on this
/// thread, if any.
pub(crate) fn current_elapsed() -> Option<Duration> {
    CURRENT_SCHEDULER
        .try_with(|current| current.borrow().as_ref().map(Scheduler::elapsed))
        .ok()
        .flatten()
}

/// Simulation environment.
///
/// A `Simulation` owns a single-threaded executor and the simulation clock.
/// Logical threads are spawned as futures which suspend themselves with
/// [`Scheduler::after()`] or [`Signal::wait()`](crate::time::Signal::wait).
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// use qnetsim::simulation::Simulation;
///
/// let mut simu = Simulation::new();
/// let ticks = Rc::new(Cell::new(0));
///
/// simu.spawn({
///     let scheduler = simu.scheduler().clone();
///     let ticks = ticks.clone();
///     async move {
///         loop {
///             scheduler.after(Duration::from_secs(1)).await;
///             ticks.set(ticks.get() + 1);
///         }
///     }
/// });
///
/// // The tick due at t=5 lies on the horizon and is not processed.
/// simu.run_for(Duration::from_secs(5)).unwrap();
/// assert_eq!(ticks.get(), 4);
/// ```
pub struct Simulation {
    executor: Executor,
    scheduler: Scheduler,
}

impl Simulation {
    /// Creates a simulation with no logical thread, starting at
    /// [`MonotonicTime::EPOCH`].
    pub fn new() -> Self {
        Self {
            executor: Executor::new(),
            scheduler: Scheduler::new(MonotonicTime::EPOCH),
        }
    }

    /// Returns a handle to the simulation clock.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> MonotonicTime {
        self.scheduler.time()
    }

    /// Returns the time elapsed since the start of the simulation.
    pub fn elapsed(&self) -> Duration {
        self.scheduler.elapsed()
    }

    /// Spawns a logical thread.
    ///
    /// The thread is first polled during the next call to
    /// [`run_until()`](Simulation::run_until), at the current simulation time.
    /// Threads spawned at the same time are first polled in spawning order.
    pub fn spawn<F>(&mut self, logical_thread: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.executor.spawn(logical_thread);
    }

    /// Returns `true` if a logical thread halted the simulation.
    pub fn is_halted(&self) -> bool {
        self.scheduler.is_halted()
    }

    /// Returns the number of logical threads that have not completed.
    pub fn thread_count(&self) -> usize {
        self.executor.task_count()
    }

    /// Runs the simulation for the specified duration.
    ///
    /// See [`run_until()`](Simulation::run_until).
    pub fn run_for(&mut self, duration: Duration) -> Result<(), SchedulingError> {
        let horizon = self.time() + duration;

        self.run_until(horizon)
    }

    /// Runs the simulation until the specified horizon.
    ///
    /// All wake-ups scheduled strictly before the horizon are processed in
    /// chronological order, ties being resolved in scheduling order. Upon
    /// return the simulation time equals the horizon, whether or not a wake-up
    /// was scheduled for that time.
    ///
    /// If a logical thread calls [`Scheduler::halt()`], the run stops as soon
    /// as the threads that are ready have been polled and the clock keeps the
    /// time at which the halt was requested. Further calls return immediately.
    ///
    /// An error is returned if the horizon lies in the past of the current
    /// simulation time.
    pub fn run_until(&mut self, horizon: MonotonicTime) -> Result<(), SchedulingError> {
        if horizon < self.time() {
            return Err(SchedulingError::InvalidScheduledTime);
        }

        if self.scheduler.is_halted() {
            return Ok(());
        }

        let _guard = CurrentSchedulerGuard::enter(&self.scheduler);

        let mut wakeup_count: u64 = 0;
        loop {
            self.executor.run_ready();

            if self.scheduler.is_halted() {
                trace!(
                    wakeup_count,
                    time = self.scheduler.elapsed().as_secs_f64(),
                    "simulation halted"
                );
                return Ok(());
            }

            match self.scheduler.pull_before(horizon) {
                Some(wakeup) => {
                    wakeup_count += 1;
                    wakeup.fire();
                }
                None => break,
            }
        }
        self.scheduler.set_time(horizon);

        trace!(
            wakeup_count,
            pending = self.scheduler.pending_wakeups(),
            "horizon reached"
        );

        Ok(())
    }

    /// Drops all pending wake-ups, so that no suspended logical thread will
    /// ever resume.
    pub fn discard_pending(&mut self) {
        self.scheduler.discard_pending();
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.time())
            .field("threads", &self.thread_count())
            .finish_non_exhaustive()
    }
}

/// Makes a clock visible to [`current_elapsed()`] for the duration of a run.
struct CurrentSchedulerGuard {
    previous: Option<Scheduler>,
}

impl CurrentSchedulerGuard {
    fn enter(scheduler: &Scheduler) -> Self {
        let previous = CURRENT_SCHEDULER.with(|current| current.replace(Some(scheduler.clone())));

        Self { previous }
    }
}

impl Drop for CurrentSchedulerGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = CURRENT_SCHEDULER.try_with(|current| current.replace(previous));
    }
}
