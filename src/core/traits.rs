//! Collaborator traits for the sentinel-client library.
//!
//! This module defines the `SentinelApi` trait every backend transport
//! must implement, plus the `NotificationSink` the coordinator pushes
//! user-visible messages through.

use crate::core::error::ApiError;
use crate::core::types::{
    AuthToken, Credentials, ScanStarted, ScanTask, TaskStatus, Website, WebsiteId,
};
use crate::notify::Notification;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// The backend collaborator contract consumed by the coordinator.
///
/// Implementations cover the authentication, website, scan, and task-status
/// endpoints of the Sentinel backend. The transport is the implementation's
/// business; the coordinator only sees these typed operations.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync` for use in async contexts.
/// - Implementations should never panic; all failures are `ApiError`s.
/// - `task_status` is called once per poll tick and should not block longer
///   than a single request round-trip; polling cadence is the caller's job.
#[async_trait]
pub trait SentinelApi: Send + Sync + Debug {
    /// Authenticates an existing account and returns a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    /// Creates a new account and returns a bearer token.
    async fn register(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    /// Fetches the authoritative list of monitored websites.
    async fn list_websites(&self, token: &AuthToken) -> Result<Vec<Website>, ApiError>;

    /// Registers a new website for monitoring.
    async fn add_website(&self, token: &AuthToken, url: &str) -> Result<Website, ApiError>;

    /// Asks the backend to start a scan for the given website.
    ///
    /// On success the backend returns the task id driving the scan plus an
    /// immediate snapshot of the website, typically already `Pending`.
    async fn begin_scan(
        &self,
        token: &AuthToken,
        id: &WebsiteId,
    ) -> Result<ScanStarted, ApiError>;

    /// Queries the current state of a scan task.
    async fn task_status(&self, token: &AuthToken, task_id: &str)
        -> Result<TaskStatus, ApiError>;
}

/// A type alias for a reference-counted API handle.
pub type ArcApi = Arc<dyn SentinelApi>;

/// Receiver for transient, user-visible messages.
///
/// The sink is purely presentational: it accepts a message and owes the
/// coordinator nothing in return. Implementations decide how long messages
/// stay visible.
pub trait NotificationSink: Send + Sync + Debug {
    /// Accepts a notification for display.
    fn notify(&self, notification: Notification);
}

/// A type alias for a reference-counted notification sink.
pub type ArcSink = Arc<dyn NotificationSink>;

/// Observer for poll lifecycle events.
///
/// The coordinator implements this to receive per-tick progress and the
/// single terminal report of each poller it spawns. Pollers hold the
/// observer weakly, so a dropped owner silently ends its polls.
#[async_trait]
pub trait PollObserver: Send + Sync {
    /// Called on each tick that observes the task in progress.
    ///
    /// Informational only; the poll loop continues afterwards.
    async fn on_progress(&self, task: &ScanTask) {
        let _ = task;
    }

    /// Called exactly once when a poller leaves the running state with a
    /// reportable outcome (terminal task state or a failed tick).
    ///
    /// Not called for externally cancelled or superseded pollers.
    async fn on_terminal(
        &self,
        website_id: &WebsiteId,
        poll_id: uuid::Uuid,
        outcome: crate::coordinator::PollOutcome,
    );
}
