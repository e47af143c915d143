// error.rs — Error types for tracker construction.
//
// Note that operation failures are NOT errors of this crate: a failed
// operation is stored as data in the Rejected state and surfaced to the
// consumer through snapshots. The only fallible boundary is construction,
// where a caller can hand us raw state.

use thiserror::Error;

/// Errors that can occur when constructing a tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The caller-supplied initial state violates the state invariant
    /// (data present iff Resolved, error present iff Rejected).
    #[error("invalid initial state: status {status} with data={has_data}, error={has_error}")]
    InvalidSeed {
        status: String,
        has_data: bool,
        has_error: bool,
    },
}
