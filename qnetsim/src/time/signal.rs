//! Single-slot wake signal.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// A wake signal on which one logical thread can park indefinitely.
///
/// A thread parks with [`wait()`](Signal::wait) and is resumed as soon as
/// another thread calls [`interrupt()`](Signal::interrupt): the woken thread is
/// polled within the same scheduling pass, before the clock advances. No timer
/// is armed while a thread is parked.
///
/// Interrupting a signal on which no thread is parked is a no-op. Callers are
/// expected to re-check their own state after every wake-up, so a missed
/// interrupt never loses work.
#[derive(Clone, Default)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    raised: Cell<bool>,
    waiter: RefCell<Option<Waker>>,
}

impl Signal {
    /// Creates a signal with no parked thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a future that completes once the signal is interrupted.
    pub fn wait(&self) -> WaitForSignal {
        WaitForSignal {
            signal: self.clone(),
        }
    }

    /// Returns `true` if a logical thread is currently parked on this signal.
    pub fn is_waiting(&self) -> bool {
        self.inner.waiter.borrow().is_some()
    }

    /// Wakes the parked logical thread, if any.
    ///
    /// Returns `true` if a thread was parked and is now scheduled to resume.
    pub fn interrupt(&self) -> bool {
        let waiter = self.inner.waiter.borrow_mut().take();
        match waiter {
            Some(waker) => {
                self.inner.raised.set(true);
                waker.wake();

                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("waiting", &self.is_waiting())
            .finish_non_exhaustive()
    }
}

/// Future returned by [`Signal::wait()`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WaitForSignal {
    signal: Signal,
}

impl Future for WaitForSignal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let inner = &self.signal.inner;

        if inner.raised.replace(false) {
            return Poll::Ready(());
        }
        *inner.waiter.borrow_mut() = Some(cx.waker().clone());

        Poll::Pending
    }
}

impl Drop for WaitForSignal {
    fn drop(&mut self) {
        // A dropped waiter must not leave the signal looking occupied.
        self.signal.inner.waiter.borrow_mut().take();
        self.signal.inner.raised.set(false);
    }
}
