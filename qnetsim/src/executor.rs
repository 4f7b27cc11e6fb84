//! Single-threaded cooperative executor.
//!
//! Logical threads (stations, job generators) are plain Rust futures. The
//! executor owns them and polls each one whenever its waker was triggered,
//! either by the clock reaching one of its timed wake-ups or by a wake signal
//! raised by another logical thread.
//!
//! Readiness is tracked with a FIFO work queue: tasks are polled in the order
//! in which they were woken, which together with the FIFO ordering of the
//! scheduler queue makes the whole simulation replayable.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Waker};

use futures_task::ArcWake;
use slab::Slab;

/// Initial capacity of the work queue.
const QUEUE_MIN_CAPACITY: usize = 32;

/// Index of a task in the executor's slab.
pub(crate) type TaskId = usize;

/// A single-threaded `async` executor.
pub(crate) struct Executor {
    /// Tasks that have not completed yet.
    tasks: Slab<Task>,
    /// Work queue shared with the task wakers.
    queue: Arc<WorkQueue>,
}

impl Executor {
    /// Creates an executor with no tasks.
    pub(crate) fn new() -> Self {
        Self {
            tasks: Slab::new(),
            queue: Arc::new(WorkQueue::new()),
        }
    }

    /// Spawns a logical thread.
    ///
    /// Note that spawned tasks are not polled until
    /// [`run_ready()`](Executor::run_ready) is called. Tasks spawned before a
    /// call to `run_ready()` are polled in spawning order.
    pub(crate) fn spawn<T>(&mut self, future: T) -> TaskId
    where
        T: Future<Output = ()> + 'static,
    {
        let entry = self.tasks.vacant_entry();
        let task_id = entry.key();
        let waker = futures_task::waker(Arc::new(TaskWaker {
            task_id,
            queue: self.queue.clone(),
        }));

        entry.insert(Task {
            future: Box::pin(future),
            waker,
        });
        self.queue.push(task_id);

        task_id
    }

    /// Polls all woken tasks until none is ready anymore, including tasks that
    /// were woken while polling other tasks.
    ///
    /// Returns the number of polls performed.
    pub(crate) fn run_ready(&mut self) -> usize {
        let mut poll_count = 0;

        while let Some(task_id) = self.queue.pop() {
            // A stale wake-up of a task that already completed is ignored.
            let Some(task) = self.tasks.get_mut(task_id) else {
                continue;
            };
            poll_count += 1;

            let mut cx = Context::from_waker(&task.waker);
            if task.future.as_mut().poll(&mut cx).is_ready() {
                self.tasks.remove(task_id);
            }
        }

        poll_count
    }

    /// Returns the number of tasks that have not completed.
    pub(crate) fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

/// A spawned logical thread.
struct Task {
    future: Pin<Box<dyn Future<Output = ()>>>,
    waker: Waker,
}

/// FIFO queue of tasks ready to be polled.
///
/// Wakers must be `Send + Sync`, hence the mutex, even though the executor
/// only ever runs on a single thread and the lock is never contended.
struct WorkQueue {
    ready: Mutex<VecDeque<TaskId>>,
}

impl WorkQueue {
    fn new() -> Self {
        Self {
            ready: Mutex::new(VecDeque::with_capacity(QUEUE_MIN_CAPACITY)),
        }
    }

    fn push(&self, task_id: TaskId) {
        self.ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task_id);
    }

    fn pop(&self) -> Option<TaskId> {
        self.ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Waker pushing its task back onto the work queue.
struct TaskWaker {
    task_id: TaskId,
    queue: Arc<WorkQueue>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.queue.push(arc_self.task_id);
    }
}
