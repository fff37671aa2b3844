//! Reporting of faults trapped at task boundaries.

use crate::cx::Cx;
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static INSIDE_TASK: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Log sink for task faults.
///
/// [`TaskGroup`](super::TaskGroup) calls exactly one of these methods per
/// trapped panic. Implementations must not panic.
pub trait FaultReporter: Send + Sync + 'static {
    /// Reports a fault from a task spawned without a context.
    fn warn(&self, message: &str);

    /// Reports a fault from a task spawned with `cx`.
    fn warn_cx(&self, cx: &Cx, message: &str) {
        let _ = cx;
        self.warn(message);
    }
}

/// Reports faults as `tracing` warn events under the `corral::task` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FaultReporter for TracingReporter {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "corral::task", "{message}");
    }

    fn warn_cx(&self, cx: &Cx, message: &str) {
        tracing::warn!(
            target: "corral::task",
            scope = cx.scope(),
            log_id = cx.log_id(),
            cancelled = cx.is_cancelled(),
            "{message}"
        );
    }
}

/// Runs `task`, catching any panic it raises.
///
/// While `task` runs, the process panic hook stays silent for this thread:
/// the caught payload goes to a [`FaultReporter`] instead, so each panic is
/// reported once. Panics elsewhere still reach whichever hook was installed
/// before the first call. A hook installed with [`std::panic::set_hook`]
/// after that call replaces the silencing for the whole process.
pub(crate) fn trap<F>(task: F) -> Result<(), Box<dyn Any + Send>>
where
    F: FnOnce(),
{
    install_quiet_hook();
    let _boundary = Boundary::enter();
    panic::catch_unwind(AssertUnwindSafe(task))
}

fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !INSIDE_TASK.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as inside a task until dropped.
struct Boundary {
    outer: bool,
}

impl Boundary {
    fn enter() -> Self {
        Self {
            outer: INSIDE_TASK.with(|inside| inside.replace(true)),
        }
    }
}

impl Drop for Boundary {
    fn drop(&mut self) {
        INSIDE_TASK.with(|inside| inside.set(self.outer));
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn panic_message_handles_common_payloads() {
        let payload = panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let code = 7;
        let payload = panic::catch_unwind(|| panic!("formatted {code}")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 7");

        let payload = panic::catch_unwind(|| panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn trap_returns_the_payload_and_clears_the_boundary() {
        let payload = trap(|| panic!("inside")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "inside");
        assert!(!INSIDE_TASK.with(Cell::get));

        assert!(trap(|| {}).is_ok());
    }

    #[test]
    fn nested_trap_keeps_the_outer_boundary() {
        let outer = trap(|| {
            let inner = trap(|| panic!("inner"));
            assert!(inner.is_err());
            assert!(INSIDE_TASK.with(Cell::get));
        });
        assert!(outer.is_ok());
        assert!(!INSIDE_TASK.with(Cell::get));
    }
}
