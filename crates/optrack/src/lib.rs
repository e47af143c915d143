//! # optrack
//!
//! Lifecycle tracking for in-flight asynchronous operations.
//!
//! An [`AsyncTracker`] wraps a single asynchronous computation (e.g. a
//! network fetch) and exposes its lifecycle as a small state machine:
//! idle → pending → resolved|rejected. Transitions route through a
//! [`DispatchGuard`], which guarantees that no state change is applied
//! after the tracker's owner has disposed of it — the "update after
//! teardown" race is suppressed by construction.
//!
//! ## Key components
//!
//! - [`AsyncTracker`] — owns the state, exposes `run`/`snapshot`/`dispose`
//! - [`DispatchGuard`] — drops transitions once disposed
//! - [`OperationState`] — snapshot of one operation (status, data, error)
//! - [`Transition`] — the closed set of state changes applied by the reducer
//! - [`SettlementPolicy`] — last-delivered-wins (reference behavior) or
//!   latest-run-only (generation-counted)
//!
//! The tracker never initiates, executes, or cancels the operation itself;
//! it receives a future from the caller and owns only settlement handling.

pub mod error;
pub mod guard;
pub mod state;
pub mod tracker;

pub use error::TrackerError;
pub use guard::DispatchGuard;
pub use state::{OperationState, OperationStatus, StateSeed, Transition};
pub use tracker::{AsyncTracker, SettlementPolicy};
