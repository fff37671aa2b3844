//! Supervised task groups.
//!
//! A [`TaskGroup`] runs closures on their own threads and tracks how many are
//! still running. A panic inside a task is trapped at the task boundary,
//! handed to the group's [`FaultReporter`], and otherwise treated as the task
//! finishing: siblings keep running and waiters are not disturbed.
//!
//! # Example
//!
//! ```
//! use corral::TaskGroup;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # fn main() -> corral::Result<()> {
//! let group = TaskGroup::new();
//! let done = Arc::new(AtomicUsize::new(0));
//! for _ in 0..4 {
//!     let done = Arc::clone(&done);
//!     group.spawn(move || {
//!         done.fetch_add(1, Ordering::SeqCst);
//!     })?;
//! }
//! group.spawn(|| panic!("isolated"))?;
//! group.wait();
//! assert_eq!(done.load(Ordering::SeqCst), 4);
//! # Ok(())
//! # }
//! ```

use crate::cx::Cx;
use crate::error::{Error, Result};
use crate::runtime::fault::{FaultReporter, TracingReporter, panic_message, trap};
use crate::sync::monitor::Monitor;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

static NEXT_TASK: AtomicU64 = AtomicU64::new(1);

type Body = Box<dyn FnOnce() + Send + 'static>;

/// Starts a named thread running `body`.
type Spawner = fn(String, Body) -> io::Result<()>;

fn spawn_thread(name: String, body: Body) -> io::Result<()> {
    thread::Builder::new().name(name).spawn(body).map(drop)
}

/// A reusable group of supervised tasks.
///
/// Cloning yields another handle to the same group, which lets tasks spawn
/// siblings.
#[derive(Clone)]
pub struct TaskGroup {
    pending: Arc<Monitor<usize>>,
    reporter: Arc<dyn FaultReporter>,
    spawner: Spawner,
}

impl TaskGroup {
    /// Creates a group that reports faults through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_reporter(Arc::new(TracingReporter))
    }

    /// Creates a group that reports faults to `reporter`.
    #[must_use]
    pub fn with_reporter(reporter: Arc<dyn FaultReporter>) -> Self {
        Self {
            pending: Arc::new(Monitor::new(0)),
            reporter,
            spawner: spawn_thread,
        }
    }

    #[cfg(test)]
    fn with_spawner(reporter: Arc<dyn FaultReporter>, spawner: Spawner) -> Self {
        Self {
            spawner,
            ..Self::with_reporter(reporter)
        }
    }

    /// Returns the number of tasks that have not finished yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        *self.pending.lock()
    }

    /// Runs `task` on a new thread.
    ///
    /// Fails with [`Error::Spawn`] if the thread cannot be created; the task
    /// is then dropped without running and is not counted.
    pub fn spawn<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.launch(None, task)
    }

    /// Runs `task` on a new thread, attributing any fault report to `cx`.
    ///
    /// The context is only used for reporting; the task is not stopped when
    /// it fires.
    pub fn spawn_with<F>(&self, cx: &Cx, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.launch(Some(cx.clone()), task)
    }

    /// Blocks until every task, including ones spawned meanwhile, has finished.
    pub fn wait(&self) {
        // A background context never fires.
        let _ = self.wait_until(&Cx::background());
    }

    /// Like [`wait`](Self::wait), but gives up when `cx` fires.
    ///
    /// Giving up leaves running tasks alone; a later `wait` still observes
    /// them finish.
    pub fn wait_until(&self, cx: &Cx) -> Result<()> {
        self.pending.wait_while(cx, |pending| *pending > 0)?;
        Ok(())
    }

    fn launch<F>(&self, cx: Option<Cx>, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        // Count the task before it can possibly finish.
        *self.pending.lock() += 1;
        let completion = Completion {
            pending: Arc::clone(&self.pending),
        };
        let reporter = Arc::clone(&self.reporter);
        let dispatch = tracing::dispatcher::get_default(tracing::Dispatch::clone);
        let id = NEXT_TASK.fetch_add(1, Ordering::Relaxed);

        let body = move || {
            let _completion = completion;
            tracing::dispatcher::with_default(&dispatch, || {
                if let Err(payload) = trap(task) {
                    let message = format!(
                        "task {id} recovered from panic: {}",
                        panic_message(payload.as_ref())
                    );
                    match &cx {
                        Some(cx) => reporter.warn_cx(cx, &message),
                        None => reporter.warn(&message),
                    }
                }
            });
        };

        // A rejected body is dropped unrun, and its completion uncounts it.
        (self.spawner)(format!("corral-task-{id}"), Box::new(body)).map_err(|err| {
            tracing::debug!(target: "corral::task", task = id, error = %err, "spawn failed");
            Error::Spawn(err.to_string())
        })
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("outstanding", &self.outstanding())
            .finish_non_exhaustive()
    }
}

/// Decrements the group's counter however the task exits.
struct Completion {
    pending: Arc<Monitor<usize>>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            drop(pending);
            self.pending.notify_all();
        }
    }
}
