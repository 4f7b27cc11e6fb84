//! Suspension and wake-up ordering of logical threads.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use qnetsim::simulation::Simulation;
use qnetsim::time::{MonotonicTime, SchedulingError, Signal};

type Trace = Rc<RefCell<Vec<(&'static str, Duration)>>>;

fn record(trace: &Trace, label: &'static str, simu_time: Duration) {
    trace.borrow_mut().push((label, simu_time));
}

#[test]
fn same_time_wakeups_resume_in_scheduling_order() {
    let trace = Trace::default();
    let mut simu = Simulation::new();

    // Armed in the order c, a, b at t=0, all due at t=1.
    for label in ["c", "a", "b"] {
        let scheduler = simu.scheduler().clone();
        let trace = trace.clone();
        simu.spawn(async move {
            scheduler.after(Duration::from_secs(1)).await;
            record(&trace, label, scheduler.elapsed());
        });
    }

    simu.run_until(MonotonicTime::EPOCH + Duration::from_secs(2))
        .unwrap();

    let labels: Vec<_> = trace.borrow().iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, vec!["c", "a", "b"]);
}

#[test]
fn wakeups_on_horizon_are_not_processed() {
    let trace = Trace::default();
    let mut simu = Simulation::new();

    {
        let scheduler = simu.scheduler().clone();
        let trace = trace.clone();
        simu.spawn(async move {
            loop {
                scheduler.after(Duration::from_millis(250)).await;
                record(&trace, "tick", scheduler.elapsed());
            }
        });
    }

    simu.run_for(Duration::from_secs(1)).unwrap();
    assert_eq!(trace.borrow().len(), 3);
    assert_eq!(simu.elapsed(), Duration::from_secs(1));

    // The tick due exactly at the previous horizon runs on the next call.
    simu.run_for(Duration::from_secs(1)).unwrap();
    assert_eq!(trace.borrow().len(), 7);
    assert_eq!(trace.borrow()[3].1, Duration::from_secs(1));
}

#[test]
fn interrupt_while_busy_is_a_noop() {
    let trace = Trace::default();
    let signal = Signal::new();
    let mut simu = Simulation::new();

    // A server busy from t=0 to t=3 that then parks on its signal.
    {
        let scheduler = simu.scheduler().clone();
        let signal = signal.clone();
        let trace = trace.clone();
        simu.spawn(async move {
            scheduler.after(Duration::from_secs(3)).await;
            record(&trace, "served", scheduler.elapsed());
            signal.wait().await;
            record(&trace, "woken", scheduler.elapsed());
        });
    }
    // Interrupts at t=1 (busy) and t=5 (parked).
    {
        let scheduler = simu.scheduler().clone();
        let trace = trace.clone();
        simu.spawn(async move {
            scheduler.after(Duration::from_secs(1)).await;
            let delivered = signal.interrupt();
            record(&trace, if delivered { "hit" } else { "miss" }, scheduler.elapsed());
            scheduler.after(Duration::from_secs(4)).await;
            let delivered = signal.interrupt();
            record(&trace, if delivered { "hit" } else { "miss" }, scheduler.elapsed());
        });
    }

    simu.run_for(Duration::from_secs(10)).unwrap();

    assert_eq!(
        *trace.borrow(),
        vec![
            ("miss", Duration::from_secs(1)),
            ("served", Duration::from_secs(3)),
            ("hit", Duration::from_secs(5)),
            ("woken", Duration::from_secs(5)),
        ]
    );
}

#[test]
fn parked_thread_arms_no_timer() {
    let signal = Signal::new();
    let mut simu = Simulation::new();

    {
        let signal = signal.clone();
        simu.spawn(async move { signal.wait().await });
    }

    simu.run_for(Duration::from_secs(1)).unwrap();

    assert!(signal.is_waiting());
    assert_eq!(simu.scheduler().pending_wakeups(), 0);
    assert_eq!(simu.thread_count(), 1);
}

#[test]
fn horizon_in_the_past_is_rejected() {
    let mut simu = Simulation::new();
    simu.run_for(Duration::from_secs(5)).unwrap();

    assert_eq!(
        simu.run_until(MonotonicTime::EPOCH + Duration::from_secs(4)),
        Err(SchedulingError::InvalidScheduledTime)
    );
    assert_eq!(simu.elapsed(), Duration::from_secs(5));
}
