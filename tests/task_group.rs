//! Task group supervision across threads.

use corral::{CancelReason, CancelToken, Cx, Error, FaultReporter, TaskGroup};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl FaultReporter for Collect {
    fn warn(&self, message: &str) {
        self.0.lock().push(message.to_owned());
    }
}

#[test]
fn wait_sees_every_task_finish() {
    let group = TaskGroup::new();
    let done = Arc::new(AtomicUsize::new(0));
    for _ in 0..64 {
        let done = Arc::clone(&done);
        group.spawn(move || {
            thread::sleep(Duration::from_millis(1));
            done.fetch_add(1, Ordering::SeqCst);
        }).unwrap();
    }
    group.wait();
    assert_eq!(done.load(Ordering::SeqCst), 64);
    assert_eq!(group.outstanding(), 0);
}

#[test]
fn panics_are_isolated_and_reported_once_each() {
    let reporter = Arc::new(Collect::default());
    let group = TaskGroup::with_reporter(reporter.clone());
    let survivors = Arc::new(AtomicUsize::new(0));

    for index in 0..10 {
        let survivors = Arc::clone(&survivors);
        group.spawn(move || {
            if index % 3 == 0 {
                panic!("task {index} blew up");
            }
            survivors.fetch_add(1, Ordering::SeqCst);
        }).unwrap();
    }
    group.wait();

    assert_eq!(survivors.load(Ordering::SeqCst), 6);
    let reports = reporter.0.lock();
    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|message| message.contains("blew up")));
}

#[test]
fn tasks_may_spawn_siblings_before_wait_returns() {
    let group = TaskGroup::new();
    let done = Arc::new(AtomicUsize::new(0));
    {
        let inner = group.clone();
        let done = Arc::clone(&done);
        group.spawn(move || {
            for _ in 0..5 {
                let done = Arc::clone(&done);
                inner.spawn(move || {
                    thread::sleep(Duration::from_millis(5));
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        })
        .unwrap();
    }
    group.wait();
    assert_eq!(done.load(Ordering::SeqCst), 5);
}

#[test]
fn group_is_reusable_after_wait() {
    let group = TaskGroup::new();
    for round in 1..=3 {
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..round {
            let done = Arc::clone(&done);
            group.spawn(move || {
                done.fetch_add(1, Ordering::SeqCst);
            }).unwrap();
        }
        group.wait();
        assert_eq!(done.load(Ordering::SeqCst), round);
    }
}

#[test]
fn bounded_wait_gives_up_on_cancel() {
    let group = TaskGroup::new();
    let release = CancelToken::new();
    {
        let release = release.clone();
        group.spawn(move || {
            while !release.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
        }).unwrap();
    }

    let stop = CancelToken::new();
    let waiter = {
        let group = group.clone();
        let cx = Cx::background().with_cancel_token(stop.clone());
        thread::spawn(move || group.wait_until(&cx))
    };
    thread::sleep(Duration::from_millis(20));
    stop.cancel(CancelReason::user("stop waiting"));
    assert!(matches!(waiter.join().unwrap(), Err(Error::Cancelled(_))));
    assert_eq!(group.outstanding(), 1);

    release.cancel(CancelReason::user("finish"));
    group.wait();
    assert_eq!(group.outstanding(), 0);
}
