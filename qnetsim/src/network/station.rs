//! Service stations.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::log::{EventKind, StationLog};
use crate::network::{Job, JobId, RoutingTable};
use crate::time::{duration_from_units, units_from_duration, MonotonicTime, Scheduler, Signal};

/// Index of a station in its network.
pub type StationId = usize;

/// Order in which queued jobs are served.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    /// First in, first out.
    #[default]
    Fifo,
    /// Shortest service demand first, ties served in arrival order.
    Sjf,
}

/// State of a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationState {
    /// Parked on its wake signal, waiting for work.
    Idle,
    /// Serving a job.
    Busy,
}

/// Statistics of a station, in model time units.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StationStats {
    /// Cumulative time spent by jobs between arrival and service start.
    pub waiting_time: f64,
    /// Cumulative time spent by jobs between arrival and service completion.
    pub response_time: f64,
    /// Cumulative time spent idle.
    pub idle_time: f64,
    /// Cumulative time spent serving jobs that completed.
    pub busy_time: f64,
    /// Jobs that entered the queue.
    pub jobs_received: u64,
    /// Jobs that entered service.
    pub jobs_started: u64,
    /// Jobs whose service completed.
    pub jobs_completed: u64,
}

/// A queueing station with a single exponential server.
///
/// A station is driven by its own logical thread, which loops between an
/// idle wait on the station's [`Signal`] and the service of queued jobs.
/// Upstream stations add work with [`enqueue()`](Station::enqueue) and the
/// job generator with [`admit()`](Station::admit); both wake the station if it
/// is idle.
pub struct Station {
    name: String,
    discipline: Discipline,
    service: Exp<f64>,
    rng: RefCell<ChaCha8Rng>,
    queue: RefCell<VecDeque<Job>>,
    state: Cell<StationState>,
    signal: Signal,
    idle_since: Cell<Option<MonotonicTime>>,
    waiting_time: Cell<Duration>,
    response_time: Cell<Duration>,
    idle_time: Cell<Duration>,
    busy_time: Cell<Duration>,
    jobs_received: Cell<u64>,
    jobs_started: Cell<u64>,
    jobs_completed: Cell<u64>,
    log: RefCell<Option<StationLog>>,
}

impl Station {
    /// Creates an idle station with an empty queue.
    ///
    /// Service demands are drawn from `service` with `rng`, which is also used
    /// to route jobs leaving the station.
    pub fn new(
        name: impl Into<String>,
        discipline: Discipline,
        service: Exp<f64>,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            name: name.into(),
            discipline,
            service,
            rng: RefCell::new(rng),
            queue: RefCell::new(VecDeque::new()),
            state: Cell::new(StationState::Idle),
            signal: Signal::new(),
            idle_since: Cell::new(None),
            waiting_time: Cell::new(Duration::ZERO),
            response_time: Cell::new(Duration::ZERO),
            idle_time: Cell::new(Duration::ZERO),
            busy_time: Cell::new(Duration::ZERO),
            jobs_received: Cell::new(0),
            jobs_started: Cell::new(0),
            jobs_completed: Cell::new(0),
            log: RefCell::new(None),
        }
    }

    /// Station name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queueing discipline.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Current state.
    pub fn state(&self) -> StationState {
        self.state.get()
    }

    /// Number of queued jobs, excluding the job in service.
    pub fn queue_len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Sends the station events to `log`, replacing any previous log.
    pub fn set_log(&self, log: StationLog) {
        *self.log.borrow_mut() = Some(log);
    }

    /// Returns `true` if the station log exists and a write to it failed.
    pub fn log_failed(&self) -> bool {
        self.log.borrow().as_ref().is_some_and(StationLog::has_failed)
    }

    /// Detaches the station log, flushes it and reports the first write
    /// error. Returns `None` if no log was attached.
    pub fn finish_log(&self) -> Option<io::Result<()>> {
        let log = self.log.borrow_mut().take();

        log.map(StationLog::finish)
    }

    /// Admits a job arriving from outside the network, logging its arrival.
    ///
    /// See [`enqueue()`](Station::enqueue).
    pub fn admit(&self, id: JobId, scheduler: &Scheduler) {
        self.push(id, scheduler, true);
    }

    /// Adds a job routed from another station to the queue, stamped with the
    /// current time, and wakes the station if it is idle.
    ///
    /// The service demand of the job is sampled here. Routed jobs are not
    /// logged as arrivals.
    pub fn enqueue(&self, id: JobId, scheduler: &Scheduler) {
        self.push(id, scheduler, false);
    }

    fn push(&self, id: JobId, scheduler: &Scheduler, external: bool) {
        let service_time = self.sample_service_time();
        let queue_len = {
            let mut queue = self.queue.borrow_mut();
            queue.push_back(Job::new(id, scheduler.time(), service_time));
            queue.len()
        };
        self.jobs_received.set(self.jobs_received.get() + 1);
        if external {
            self.record(id, EventKind::Arrival, scheduler, queue_len);
        }

        trace!(
            station = %self.name,
            job = %id,
            queue_len,
            external,
            "job enqueued"
        );

        if self.state.get() == StationState::Idle {
            self.signal.interrupt();
        }
    }

    /// Removes the next job to be served, if any.
    pub fn dequeue(&self) -> Option<Job> {
        let mut queue = self.queue.borrow_mut();
        match self.discipline {
            Discipline::Fifo => queue.pop_front(),
            Discipline::Sjf => {
                let (position, _) = queue
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, job)| job.service_time)?;
                queue.remove(position)
            }
        }
    }

    /// Computes the statistics of the station at the specified horizon.
    ///
    /// An idle period still open at the horizon is accounted up to the
    /// horizon.
    pub fn snapshot(&self, horizon: MonotonicTime) -> StationStats {
        let mut idle_time = self.idle_time.get();
        if let Some(since) = self.idle_since.get() {
            if horizon > since {
                idle_time += horizon.duration_since(since);
            }
        }

        StationStats {
            waiting_time: units_from_duration(self.waiting_time.get()),
            response_time: units_from_duration(self.response_time.get()),
            idle_time: units_from_duration(idle_time),
            busy_time: units_from_duration(self.busy_time.get()),
            jobs_received: self.jobs_received.get(),
            jobs_started: self.jobs_started.get(),
            jobs_completed: self.jobs_completed.get(),
        }
    }

    fn sample_service_time(&self) -> Duration {
        let units = self.service.sample(&mut *self.rng.borrow_mut());

        duration_from_units(units)
    }

    /// Logs an event; a failed log halts the simulation.
    fn record(&self, id: JobId, kind: EventKind, scheduler: &Scheduler, queue_len: usize) {
        if let Some(log) = self.log.borrow_mut().as_mut() {
            log.record(id, kind, scheduler.elapsed(), queue_len);
        }
        if self.log_failed() && !scheduler.is_halted() {
            warn!(station = %self.name, "station log failed, halting the simulation");
            scheduler.halt();
        }
    }

    fn go_idle(&self, now: MonotonicTime) {
        self.state.set(StationState::Idle);
        self.idle_since.set(Some(now));

        debug!(station = %self.name, "station idle");
    }

    fn wake(&self, now: MonotonicTime) {
        if let Some(since) = self.idle_since.take() {
            self.idle_time
                .set(self.idle_time.get() + now.duration_since(since));
        }
        self.state.set(StationState::Busy);

        debug!(station = %self.name, queue_len = self.queue_len(), "station woken up");
    }

    fn begin_service(&self, job: &Job, scheduler: &Scheduler) {
        let now = scheduler.time();
        self.state.set(StationState::Busy);
        self.waiting_time
            .set(self.waiting_time.get() + now.duration_since(job.arrival_time));
        self.jobs_started.set(self.jobs_started.get() + 1);
        self.record(job.id, EventKind::ServiceStart, scheduler, self.queue_len());

        trace!(
            station = %self.name,
            job = %job.id,
            service_time = units_from_duration(job.service_time),
            "service started"
        );
    }

    fn end_service(&self, job: &Job, started: MonotonicTime, now: MonotonicTime) {
        let waiting = started.duration_since(job.arrival_time);
        let response = now.duration_since(job.arrival_time);
        debug_assert!(response >= waiting, "response time shorter than waiting time");

        self.response_time.set(self.response_time.get() + response);
        self.busy_time
            .set(self.busy_time.get() + now.duration_since(started));
        self.jobs_completed.set(self.jobs_completed.get() + 1);

        trace!(station = %self.name, job = %job.id, "service completed");
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("name", &self.name)
            .field("discipline", &self.discipline)
            .field("state", &self.state.get())
            .field("queue_len", &self.queue_len())
            .finish_non_exhaustive()
    }
}

/// Logical thread of station `id`.
///
/// Completed jobs are routed with the station's own random stream and
/// enqueued at their next hop, or leave the network at a sink.
pub(crate) async fn serve(
    stations: Rc<[Station]>,
    routing: Rc<RoutingTable>,
    id: StationId,
    scheduler: Scheduler,
) {
    let station = &stations[id];

    loop {
        let Some(job) = station.dequeue() else {
            station.go_idle(scheduler.time());
            station.signal.wait().await;
            station.wake(scheduler.time());
            continue;
        };

        let started = scheduler.time();
        station.begin_service(&job, &scheduler);
        scheduler.after(job.service_time).await;
        station.end_service(&job, started, scheduler.time());

        let next_hop = routing.next_hop(id, &mut *station.rng.borrow_mut());
        match next_hop {
            Some(next) => stations[next].enqueue(job.id, &scheduler),
            None => trace!(station = %station.name, job = %job.id, "job left the network"),
        }
    }
}
