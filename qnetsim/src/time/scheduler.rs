//! Simulation clock and timed suspension.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use thiserror::Error;

use crate::time::MonotonicTime;
use crate::util::priority_queue::PriorityQueue;

/// Shorthand for the scheduler queue type.
pub(crate) type SchedulerQueue = PriorityQueue<MonotonicTime, Wakeup>;

/// A handle to the simulation clock.
///
/// A `Scheduler` gives logical threads access to the current simulation time
/// and lets them suspend themselves for a given virtual duration with
/// [`after()`](Scheduler::after). All clones of a `Scheduler` refer to the same
/// clock and the same queue of pending wake-ups.
///
/// The clock itself is advanced by the owning
/// [`Simulation`](crate::simulation::Simulation), never by logical threads.
///
/// # Examples
///
/// A logical thread that records the time at which it resumes.
///
/// ```
/// use std::time::Duration;
///
/// use qnetsim::simulation::Simulation;
/// use qnetsim::time::MonotonicTime;
///
/// let mut simu = Simulation::new();
/// let scheduler = simu.scheduler().clone();
///
/// simu.spawn(async move {
///     scheduler.after(Duration::from_millis(1500)).await;
///     assert_eq!(scheduler.elapsed(), Duration::from_millis(1500));
/// });
///
/// simu.run_until(MonotonicTime::EPOCH + Duration::from_secs(2)).unwrap();
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    start_time: MonotonicTime,
    time: Cell<MonotonicTime>,
    queue: RefCell<SchedulerQueue>,
    halted: Cell<bool>,
}

impl Scheduler {
    /// Creates a new clock starting at the specified time.
    pub(crate) fn new(start_time: MonotonicTime) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                start_time,
                time: Cell::new(start_time),
                queue: RefCell::new(SchedulerQueue::new()),
                halted: Cell::new(false),
            }),
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> MonotonicTime {
        self.inner.time.get()
    }

    /// Returns the time elapsed since the start of the simulation.
    pub fn elapsed(&self) -> Duration {
        self.time().duration_since(self.inner.start_time)
    }

    /// Returns the time at which the simulation started.
    pub fn start_time(&self) -> MonotonicTime {
        self.inner.start_time
    }

    /// Returns a future that completes once the specified duration has
    /// elapsed in simulation time.
    ///
    /// The wake-up is armed on the first poll. Wake-ups armed for the same
    /// time resolve in the order in which they were armed, including
    /// zero-duration wake-ups, which resume the caller after all other
    /// logical threads already due at the current time.
    pub fn after(&self, duration: Duration) -> Sleep {
        Sleep {
            scheduler: self.clone(),
            duration,
            fired: None,
        }
    }

    /// Requests the simulation to stop.
    ///
    /// The owning [`Simulation`](crate::simulation::Simulation) returns from
    /// its current run once the logical threads that are already ready have
    /// yielded, without advancing the clock any further. A halted simulation
    /// never resumes.
    pub fn halt(&self) {
        self.inner.halted.set(true);
    }

    /// Returns `true` if the simulation was halted.
    pub fn is_halted(&self) -> bool {
        self.inner.halted.get()
    }

    /// Returns the number of armed wake-ups that have not fired.
    pub fn pending_wakeups(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Arms a wake-up at the lapse of `duration` and returns its fired flag.
    fn arm(&self, duration: Duration, waker: Waker) -> Rc<Cell<bool>> {
        let now = self.time();
        // Saturate rather than overflow for absurdly long delays; such
        // wake-ups lie beyond any horizon and never fire.
        let headroom = MonotonicTime::MAX.duration_since(now);
        let deadline = if duration >= headroom {
            MonotonicTime::MAX
        } else {
            now + duration
        };

        let fired = Rc::new(Cell::new(false));
        self.inner.queue.borrow_mut().insert(
            deadline,
            Wakeup {
                waker,
                fired: fired.clone(),
            },
        );

        fired
    }

    /// Pulls the earliest wake-up scheduled strictly before the specified
    /// horizon and advances the clock to its time.
    pub(crate) fn pull_before(&self, horizon: MonotonicTime) -> Option<Wakeup> {
        let mut queue = self.inner.queue.borrow_mut();
        match queue.peek_key().copied() {
            Some(time) if time < horizon => {
                let (time, wakeup) = queue.pull()?;
                debug_assert!(time >= self.time(), "simulation time went backward");
                self.inner.time.set(time);

                Some(wakeup)
            }
            _ => None,
        }
    }

    /// Sets the simulation time.
    pub(crate) fn set_time(&self, time: MonotonicTime) {
        debug_assert!(time >= self.time(), "simulation time went backward");
        self.inner.time.set(time);
    }

    /// Drops all pending wake-ups without firing them.
    pub(crate) fn discard_pending(&self) {
        self.inner.queue.borrow_mut().clear();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("time", &self.time())
            .field("pending_wakeups", &self.pending_wakeups())
            .field("halted", &self.is_halted())
            .finish_non_exhaustive()
    }
}

/// A timed wake-up held in the scheduler queue.
pub(crate) struct Wakeup {
    waker: Waker,
    fired: Rc<Cell<bool>>,
}

impl Wakeup {
    /// Marks the wake-up as fired and wakes the suspended logical thread.
    pub(crate) fn fire(self) {
        self.fired.set(true);
        self.waker.wake();
    }
}

/// Future returned by [`Scheduler::after()`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Sleep {
    scheduler: Scheduler,
    duration: Duration,
    fired: Option<Rc<Cell<bool>>>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if let Some(fired) = &this.fired {
            return if fired.get() {
                Poll::Ready(())
            } else {
                Poll::Pending
            };
        }
        this.fired = Some(this.scheduler.arm(this.duration, cx.waker().clone()));

        Poll::Pending
    }
}

/// Error returned when the clock cannot be advanced to the requested time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// The requested time lies in the past of the current simulation time.
    #[error("the requested time lies in the past of the current simulation time")]
    InvalidScheduledTime,
}
