// tracker.rs — AsyncTracker: own the state of one in-flight operation.
//
// The tracker is the sole caller of the reducer. `run` applies Pending
// synchronously, then spawns the operation and routes its settlement back
// through the dispatch guard, so nothing is written after disposal.
//
// The tracker never executes or cancels the operation itself; it only owns
// settlement handling. True cancellation is the caller's job.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::error::TrackerError;
use crate::guard::DispatchGuard;
use crate::state::{reduce, OperationState, StateSeed, Transition};

/// What to do when a superseded operation settles after a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementPolicy {
    /// The most recently *delivered* settlement wins, even if it belongs to
    /// an older `run`. This is the reference behavior: delivery order, not
    /// issue order, determines the final state.
    #[default]
    LastDelivered,

    /// Only the most recent `run` may settle the state; settlements from
    /// superseded runs are dropped. A generation counter identifies the
    /// current run.
    LatestRunOnly,
}

/// Tracks the lifecycle of a single in-flight asynchronous operation.
///
/// The state machine is idle → pending → resolved|rejected, re-entrant via
/// further `run` calls. Once `dispose()` is called (or the tracker is
/// dropped), no settlement changes the observable state again.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use optrack::AsyncTracker;
///
/// let tracker: AsyncTracker<u32, String> = AsyncTracker::new();
/// tracker.run(async { Ok(42) });
/// assert!(tracker.snapshot().is_pending());
/// # }
/// ```
pub struct AsyncTracker<T, E> {
    state: Arc<Mutex<OperationState<T, E>>>,
    guard: DispatchGuard<T, E>,
    generation: Arc<AtomicU64>,
    policy: SettlementPolicy,
}

impl<T, E> AsyncTracker<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a tracker in the Idle state with the default settlement
    /// policy ([`SettlementPolicy::LastDelivered`]).
    pub fn new() -> Self {
        Self::from_parts(OperationState::idle(), SettlementPolicy::default())
    }

    /// Create an Idle tracker with an explicit settlement policy.
    pub fn with_policy(policy: SettlementPolicy) -> Self {
        Self::from_parts(OperationState::idle(), policy)
    }

    /// Create a tracker pre-seeded with initial state overrides, e.g.
    /// starting as Pending when the caller already knows work is underway.
    /// Fails if the seeded state violates the data/error invariant.
    pub fn with_seed(seed: StateSeed<T, E>) -> Result<Self, TrackerError> {
        Ok(Self::from_parts(seed.into_state()?, SettlementPolicy::default()))
    }

    /// Create a pre-seeded tracker with an explicit settlement policy.
    pub fn with_seed_and_policy(
        seed: StateSeed<T, E>,
        policy: SettlementPolicy,
    ) -> Result<Self, TrackerError> {
        Ok(Self::from_parts(seed.into_state()?, policy))
    }

    fn from_parts(initial: OperationState<T, E>, policy: SettlementPolicy) -> Self {
        let state = Arc::new(Mutex::new(initial));
        let reducer_state = Arc::clone(&state);
        let guard = DispatchGuard::new(move |transition: Transition<T, E>| {
            // Poison recovery is sound here: the reducer replaces the whole
            // value, so the slot always holds a coherent state.
            let mut slot = reducer_state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let next = reduce(&slot, transition);
            *slot = next;
        });
        Self {
            state,
            guard,
            generation: Arc::new(AtomicU64::new(0)),
            policy,
        }
    }

    /// Start tracking an operation.
    ///
    /// Applies Pending through the guard synchronously — consumers see a
    /// Pending snapshot the instant this returns — then spawns the
    /// operation on the tokio runtime and routes its settlement back
    /// through the guard. Completion is observed via [`snapshot`], not a
    /// return value.
    ///
    /// Calling `run` again before a prior operation settles is permitted;
    /// the superseded operation keeps executing, and what happens when it
    /// settles is governed by the [`SettlementPolicy`].
    ///
    /// Must be called within a tokio runtime.
    ///
    /// [`snapshot`]: AsyncTracker::snapshot
    pub fn run<F>(&self, operation: F)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let op_id = Uuid::new_v4();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%op_id, generation, "operation started");

        self.guard.dispatch(Transition::Pending);

        let guard = self.guard.clone();
        let current_generation = Arc::clone(&self.generation);
        let policy = self.policy;
        tokio::spawn(async move {
            let outcome = operation.await;
            if policy == SettlementPolicy::LatestRunOnly
                && current_generation.load(Ordering::SeqCst) != generation
            {
                tracing::trace!(%op_id, generation, "stale settlement discarded");
                return;
            }
            match outcome {
                Ok(value) => {
                    tracing::debug!(%op_id, generation, "operation resolved");
                    guard.dispatch(Transition::Resolved(value));
                }
                Err(error) => {
                    tracing::debug!(%op_id, generation, "operation rejected");
                    guard.dispatch(Transition::Rejected(error));
                }
            }
        });
    }

    /// Settle the state directly with a success value, bypassing `run`.
    /// Routed through the guard like any settlement, so it is a no-op after
    /// disposal.
    pub fn set_data(&self, value: T) {
        self.guard.dispatch(Transition::Resolved(value));
    }

    /// Settle the state directly with a failure value. No-op after
    /// disposal.
    pub fn set_error(&self, error: E) {
        self.guard.dispatch(Transition::Rejected(error));
    }

    /// Read the current state by value. Snapshots never expose a live
    /// reference, so consumers cannot observe a torn mid-transition state.
    pub fn snapshot(&self) -> OperationState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop observing settlements. Idempotent; valid before any `run`.
    /// After this call the observable state is frozen at its current value.
    pub fn dispose(&self) {
        self.guard.dispose();
    }

    /// Whether the tracker has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.guard.is_disposed()
    }
}

impl<T, E> Default for AsyncTracker<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Drop for AsyncTracker<T, E> {
    fn drop(&mut self) {
        // The owning context is gone; in-flight continuations still hold
        // guard clones and must not write into the abandoned state.
        self.guard.dispose();
    }
}
