// state.rs — OperationState: the lifecycle of one asynchronous operation.
//
// The state machine is small and deliberate:
//   Idle --run--> Pending --success--> Resolved
//                 Pending --failure--> Rejected
//   Resolved/Rejected --run--> Pending   (re-entrant)
//
// Transitions are described by a closed `Transition` enum and applied by a
// pure reducer. There is no "unhandled transition" runtime path: the match
// is exhaustive, so an unrecognized tag is a compile error rather than a
// defect discovered in production.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Where an operation is in its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// No operation has been started yet.
    Idle,

    /// An operation is in flight; no result is available.
    Pending,

    /// The most recently delivered settlement succeeded.
    Resolved,

    /// The most recently delivered settlement failed.
    Rejected,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Idle => write!(f, "idle"),
            OperationStatus::Pending => write!(f, "pending"),
            OperationStatus::Resolved => write!(f, "resolved"),
            OperationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Snapshot of one tracked operation: status plus at most one of a result
/// value or a failure value.
///
/// Invariant: `data` is `Some` iff `status == Resolved`, `error` is `Some`
/// iff `status == Rejected`; in Idle and Pending both are `None`. Every
/// value produced by the reducer satisfies this, and seeded construction
/// validates it at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationState<T, E> {
    /// Current lifecycle status.
    pub status: OperationStatus,

    /// Result value, present only in the Resolved status.
    pub data: Option<T>,

    /// Failure value, present only in the Rejected status.
    pub error: Option<E>,
}

impl<T, E> OperationState<T, E> {
    /// The default starting point: no operation yet, nothing to show.
    pub fn idle() -> Self {
        Self {
            status: OperationStatus::Idle,
            data: None,
            error: None,
        }
    }

    /// No operation has been started.
    pub fn is_idle(&self) -> bool {
        self.status == OperationStatus::Idle
    }

    /// An operation is in flight.
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    /// The last delivered settlement was a success.
    pub fn is_resolved(&self) -> bool {
        self.status == OperationStatus::Resolved
    }

    /// The last delivered settlement was a failure.
    pub fn is_rejected(&self) -> bool {
        self.status == OperationStatus::Rejected
    }

    /// Check the data/error-vs-status invariant.
    pub fn invariant_holds(&self) -> bool {
        match self.status {
            OperationStatus::Resolved => self.data.is_some() && self.error.is_none(),
            OperationStatus::Rejected => self.data.is_none() && self.error.is_some(),
            OperationStatus::Idle | OperationStatus::Pending => {
                self.data.is_none() && self.error.is_none()
            }
        }
    }
}

impl<T, E> Default for OperationState<T, E> {
    fn default() -> Self {
        Self::idle()
    }
}

/// A tagged description of a state change, applied by the reducer.
///
/// This is a closed set: consumers cannot invent transition kinds, so the
/// reducer never sees an unrecognized tag.
#[derive(Debug, Clone)]
pub enum Transition<T, E> {
    /// An operation has started; clear any previous result.
    Pending,

    /// An operation settled successfully with a value.
    Resolved(T),

    /// An operation settled with a failure.
    Rejected(E),
}

impl<T, E> Transition<T, E> {
    /// Get the transition kind as a string (for log fields).
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::Pending => "pending",
            Transition::Resolved(_) => "resolved",
            Transition::Rejected(_) => "rejected",
        }
    }
}

/// Pure reducer: compute the next state from the current state and a
/// transition. Every transition fully determines the next state, so the
/// current state only participates as the reducer signature.
pub(crate) fn reduce<T, E>(
    _current: &OperationState<T, E>,
    transition: Transition<T, E>,
) -> OperationState<T, E> {
    match transition {
        Transition::Pending => OperationState {
            status: OperationStatus::Pending,
            data: None,
            error: None,
        },
        Transition::Resolved(value) => OperationState {
            status: OperationStatus::Resolved,
            data: Some(value),
            error: None,
        },
        Transition::Rejected(error) => OperationState {
            status: OperationStatus::Rejected,
            data: None,
            error: Some(error),
        },
    }
}

/// Caller-supplied overrides for a tracker's initial state.
///
/// Merged over the Idle default at construction, e.g. to start a tracker
/// pre-seeded as Pending when the caller already knows work is starting:
///
/// ```
/// use optrack::{AsyncTracker, OperationStatus, StateSeed};
///
/// let seed = StateSeed::<String, String>::new().status(OperationStatus::Pending);
/// let tracker = AsyncTracker::with_seed(seed).unwrap();
/// assert!(tracker.snapshot().is_pending());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateSeed<T, E> {
    status: Option<OperationStatus>,
    data: Option<T>,
    error: Option<E>,
}

impl<T, E> StateSeed<T, E> {
    /// Start from the Idle default with no overrides.
    pub fn new() -> Self {
        Self {
            status: None,
            data: None,
            error: None,
        }
    }

    /// Override the initial status.
    pub fn status(mut self, status: OperationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Pre-seed a result value (requires the Resolved status).
    pub fn data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    /// Pre-seed a failure value (requires the Rejected status).
    pub fn error(mut self, error: E) -> Self {
        self.error = Some(error);
        self
    }

    /// Merge over the Idle default and validate the state invariant.
    pub fn into_state(self) -> Result<OperationState<T, E>, TrackerError> {
        let state = OperationState {
            status: self.status.unwrap_or(OperationStatus::Idle),
            data: self.data,
            error: self.error,
        };
        if !state.invariant_holds() {
            return Err(TrackerError::InvalidSeed {
                status: state.status.to_string(),
                has_data: state.data.is_some(),
                has_error: state.error.is_some(),
            });
        }
        Ok(state)
    }
}
