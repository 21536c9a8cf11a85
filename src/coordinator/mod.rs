//! Scan lifecycle coordination.
//!
//! This module ties the building blocks together: the [`ScanCoordinator`]
//! starts scans and owns the website mirror, the [`ScanRegistry`] tracks
//! at most one live poll per website, and the task poller drives each
//! backend task to a terminal state in the background.
//!
//! All polling is fully asynchronous: starting a scan returns as soon as
//! the backend has acknowledged it, and results arrive later through
//! store merges and sink notifications.

mod coordinator;
mod poller;
mod registry;

pub use coordinator::{CoordinatorConfig, ScanCoordinator, ScanCoordinatorBuilder};
pub use poller::{PollHandle, PollOutcome, PollState, DEFAULT_POLL_INTERVAL};
pub use registry::ScanRegistry;
