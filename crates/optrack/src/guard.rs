// guard.rs — DispatchGuard: drop transitions after disposal.
//
// Settlement continuations can fire long after the owner of a tracker has
// torn down. The guard makes the transition-applying function safe to call
// from those late continuations: while alive it forwards, once disposed it
// drops the transition silently. Dropping stale updates is expected, not
// exceptional, so no error is raised.
//
// The disposed flag is an AtomicBool read at dispatch time, so a disposal
// on one thread is observed by continuations delivered on another.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::state::Transition;

/// Wraps a raw transition-applying function so that transitions are
/// silently dropped once the guard has been disposed.
///
/// Cloning shares the same guard state: continuations hold clones, and a
/// `dispose()` through any handle stops them all.
pub struct DispatchGuard<T, E> {
    inner: Arc<GuardInner<T, E>>,
}

struct GuardInner<T, E> {
    disposed: AtomicBool,
    raw: Box<dyn Fn(Transition<T, E>) + Send + Sync>,
}

impl<T, E> DispatchGuard<T, E> {
    /// Wrap a raw dispatch function. The guard starts alive.
    pub fn new(raw: impl Fn(Transition<T, E>) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(GuardInner {
                disposed: AtomicBool::new(false),
                raw: Box::new(raw),
            }),
        }
    }

    /// Apply a transition through the wrapped function, unless the guard
    /// has been disposed. The flag is observed at the time this executes,
    /// not at the time the caller was scheduled.
    pub fn dispatch(&self, transition: Transition<T, E>) {
        if self.inner.disposed.load(Ordering::Acquire) {
            tracing::trace!(kind = transition.kind(), "transition dropped after disposal");
            return;
        }
        (self.inner.raw)(transition);
    }

    /// Mark the guard disposed. Idempotent; there is no path back to alive.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::AcqRel) {
            tracing::debug!("dispatch guard disposed");
        }
    }

    /// Whether `dispose()` has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl<T, E> Clone for DispatchGuard<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for DispatchGuard<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchGuard")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// A guard over a recorder that collects transition kinds.
    fn recording_guard() -> (DispatchGuard<i32, String>, Arc<Mutex<Vec<&'static str>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let guard = DispatchGuard::new(move |transition: Transition<i32, String>| {
            recorder.lock().unwrap().push(transition.kind());
        });
        (guard, seen)
    }

    #[test]
    fn dispatch_forwards_while_alive() {
        let (guard, seen) = recording_guard();
        guard.dispatch(Transition::Pending);
        guard.dispatch(Transition::Resolved(1));
        assert_eq!(*seen.lock().unwrap(), vec!["pending", "resolved"]);
    }

    #[test]
    fn dispatch_is_dropped_after_dispose() {
        let (guard, seen) = recording_guard();
        guard.dispatch(Transition::Pending);
        guard.dispose();
        guard.dispatch(Transition::Resolved(1));
        guard.dispatch(Transition::Rejected("late".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec!["pending"]);
    }

    #[test]
    fn dispose_is_idempotent() {
        let (guard, seen) = recording_guard();
        guard.dispose();
        guard.dispose();
        guard.dispose();
        assert!(guard.is_disposed());
        guard.dispatch(Transition::Pending);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn clones_share_disposal() {
        let (guard, seen) = recording_guard();
        let continuation_handle = guard.clone();
        guard.dispose();
        continuation_handle.dispatch(Transition::Resolved(7));
        assert!(continuation_handle.is_disposed());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn disposal_is_observed_across_threads() {
        let (guard, seen) = recording_guard();
        let remote = guard.clone();
        std::thread::spawn(move || remote.dispose())
            .join()
            .expect("dispose thread panicked");
        guard.dispatch(Transition::Resolved(7));
        assert!(guard.is_disposed());
        assert!(seen.lock().unwrap().is_empty());
    }
}
