//! Job arrivals.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use tracing::{debug, trace};

use crate::network::{JobId, Station, StationId};
use crate::time::{duration_from_units, Scheduler};

/// A Poisson source of jobs feeding a single station.
///
/// The generator sleeps for exponentially distributed gaps and, after each
/// gap, injects a job with a fresh identity into its target station until
/// `max_jobs` jobs have been produced. It then parks forever without any
/// timer armed.
pub struct JobGenerator {
    target: StationId,
    interarrival: Exp<f64>,
    max_jobs: u64,
    produced: Cell<u64>,
    rng: RefCell<ChaCha8Rng>,
}

impl JobGenerator {
    /// Creates a generator feeding station `target`.
    pub fn new(target: StationId, interarrival: Exp<f64>, max_jobs: u64, rng: ChaCha8Rng) -> Self {
        Self {
            target,
            interarrival,
            max_jobs,
            produced: Cell::new(0),
            rng: RefCell::new(rng),
        }
    }

    /// Station receiving the generated jobs.
    pub fn target(&self) -> StationId {
        self.target
    }

    /// Maximum number of jobs produced.
    pub fn max_jobs(&self) -> u64 {
        self.max_jobs
    }

    /// Number of jobs produced so far.
    pub fn produced(&self) -> u64 {
        self.produced.get()
    }

    /// Logical thread of the generator.
    pub(crate) async fn run(self: Rc<Self>, stations: Rc<[Station]>, scheduler: Scheduler) {
        let target = &stations[self.target];

        loop {
            let gap = self.interarrival.sample(&mut *self.rng.borrow_mut());
            scheduler.after(duration_from_units(gap)).await;

            let produced = self.produced.get();
            if produced >= self.max_jobs {
                debug!(produced, "arrival cap reached");
                std::future::pending::<()>().await;
            }

            let id = JobId(produced);
            target.admit(id, &scheduler);
            self.produced.set(produced + 1);

            trace!(job = %id, station = target.name(), "job generated");
        }
    }
}

impl fmt::Debug for JobGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobGenerator")
            .field("target", &self.target)
            .field("max_jobs", &self.max_jobs)
            .field("produced", &self.produced.get())
            .finish_non_exhaustive()
    }
}
