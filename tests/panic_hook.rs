//! The process panic hook and task fault reports do not double up.
//!
//! Kept in its own test binary with a single test: the panic hook is
//! process-wide state.

use corral::{FaultReporter, TaskGroup};
use parking_lot::Mutex;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl FaultReporter for Collect {
    fn warn(&self, message: &str) {
        self.0.lock().push(message.to_owned());
    }
}

#[test]
fn task_panics_skip_the_hook_and_other_panics_still_reach_it() {
    let hook_calls = Arc::new(AtomicUsize::new(0));
    {
        let hook_calls = Arc::clone(&hook_calls);
        panic::set_hook(Box::new(move |_| {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let reporter = Arc::new(Collect::default());
    let group = TaskGroup::with_reporter(reporter.clone());
    for index in 0..3 {
        group.spawn(move || panic!("task {index} failed")).unwrap();
    }
    group.wait();

    assert_eq!(reporter.0.lock().len(), 3);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 0);

    // A panic outside any task is still seen by the earlier hook.
    let outside = thread::spawn(|| panic::catch_unwind(|| panic!("not a task")).is_err());
    assert!(outside.join().unwrap());
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);

    // The task thread's boundary does not leak onto the caller.
    assert!(panic::catch_unwind(|| panic!("caller")).is_err());
    assert_eq!(hook_calls.load(Ordering::SeqCst), 2);

    drop(panic::take_hook());
}
