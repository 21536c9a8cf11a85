//! Core types used throughout the sentinel-client library.
//!
//! This module defines the data model shared between the coordinator and
//! the backend collaborators: monitored websites, individual check results,
//! backend scan tasks, and authentication material.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a monitored website.
///
/// Identifiers are issued by the backend when a website is registered and
/// are stable for the lifetime of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebsiteId(String);

impl WebsiteId {
    /// Creates a website id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WebsiteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WebsiteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Scan status of a monitored website.
///
/// This is the *entity* status, distinct from [`TaskState`] which mirrors
/// the backend job runner's view of an individual scan task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebsiteStatus {
    /// The website has never been scanned.
    #[serde(rename = "Not Scanned")]
    NotScanned,
    /// A scan has been requested and is in flight.
    Pending,
    /// The most recent scan completed and results are available.
    Scanned,
    /// The most recent scan failed.
    Error,
}

impl WebsiteStatus {
    /// Returns `true` if a scan result set is expected for this status.
    pub fn has_results(&self) -> bool {
        matches!(self, Self::Scanned)
    }
}

impl fmt::Display for WebsiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotScanned => "Not Scanned",
            Self::Pending => "Pending",
            Self::Scanned => "Scanned",
            Self::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Outcome of a single security check performed during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// The checked control is present and configured.
    Present,
    /// The checked control is missing.
    Missing,
    /// The check itself could not be evaluated.
    Error,
}

/// One security check result, e.g. a single HTTP security header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Identifier of the check performed, e.g. `"HSTS"`.
    pub name: String,
    /// Whether the control was present, missing, or unevaluable.
    pub status: CheckStatus,
    /// Human-readable detail, e.g. the observed header value.
    pub value: String,
}

impl CheckResult {
    /// Creates a new check result.
    pub fn new(
        name: impl Into<String>,
        status: CheckStatus,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            value: value.into(),
        }
    }
}

/// A monitored website together with its latest known scan state.
///
/// The authoritative copy lives on the backend; instances held client-side
/// are mirrors refreshed through coordinator merges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    /// Stable identifier issued by the backend.
    pub id: WebsiteId,

    /// User-supplied target URL.
    pub url: String,

    /// Current scan status.
    pub status: WebsiteStatus,

    /// When the last scan reached a terminal state, if any.
    #[serde(rename = "last_scanned", default)]
    pub last_scanned_at: Option<DateTime<Utc>>,

    /// Results of the last successful scan. Replaced wholesale on each
    /// successful merge, never updated piecemeal.
    #[serde(default)]
    pub scan_results: Option<Vec<CheckResult>>,
}

impl Website {
    /// Creates a never-scanned website entry.
    pub fn new(id: impl Into<WebsiteId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status: WebsiteStatus::NotScanned,
            last_scanned_at: None,
            scan_results: None,
        }
    }

    /// Returns `true` if a scan is currently expected to be in flight.
    pub fn is_pending(&self) -> bool {
        self.status == WebsiteStatus::Pending
    }
}

/// State of a backend scan task, as reported by the job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// The task has been accepted but not yet started.
    Pending,
    /// The task is running; a progress message may be available.
    Progress,
    /// The task finished and produced results.
    Success,
    /// The task finished with an error.
    Failure,
}

impl TaskState {
    /// Returns `true` for the absorbing states, after which the backend
    /// reports no further transitions for the task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Progress => "PROGRESS",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

/// A scan task tracked by a poller: the client-side mirror of one backend
/// job, tied to the website it updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanTask {
    /// Opaque identifier issued by the backend at scan start.
    pub task_id: String,

    /// The website this task updates.
    pub website_id: WebsiteId,

    /// Last observed state of the task.
    pub state: TaskState,

    /// Informational progress message, if the backend reported one.
    pub progress_message: Option<String>,
}

impl ScanTask {
    /// Creates a freshly started task in the `Pending` state.
    pub fn started(task_id: impl Into<String>, website_id: WebsiteId) -> Self {
        Self {
            task_id: task_id.into(),
            website_id,
            state: TaskState::Pending,
            progress_message: None,
        }
    }
}

/// One observation returned by the task-status endpoint.
///
/// On `Success` the backend includes the authoritative final website
/// payload, which the coordinator merges wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Reported task state.
    pub state: TaskState,

    /// Informational message, present for `Progress` and `Failure`.
    #[serde(rename = "message", default)]
    pub progress_message: Option<String>,

    /// Final website payload, present once the state is `Success`.
    #[serde(default)]
    pub website: Option<Website>,
}

impl TaskStatus {
    /// Creates a bare observation with the given state.
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            progress_message: None,
            website: None,
        }
    }

    /// Attaches a progress or failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.progress_message = Some(message.into());
        self
    }

    /// Attaches the final website payload.
    pub fn with_website(mut self, website: Website) -> Self {
        self.website = Some(website);
        self
    }
}

/// Response to a successful begin-scan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStarted {
    /// Identifier of the backend task driving the scan.
    pub task_id: String,

    /// Immediate snapshot of the website, typically with status `Pending`.
    pub website: Website,
}

/// Opaque bearer credential attached to authenticated requests.
///
/// The token string is kept secret and redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct AuthToken {
    secret: SecretString,
}

impl AuthToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(token.into()),
        }
    }

    /// Renders the `Authorization` header value for this token.
    pub(crate) fn authorization_header(&self) -> String {
        format!("Bearer {}", self.secret.expose_secret())
    }
}

/// Login or registration credentials.
///
/// The password is kept secret and redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password (kept secret).
    pub password: SecretString,
}

impl Credentials {
    /// Creates credentials from an email and password pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_website_status_wire_names() {
        let json = serde_json::to_string(&WebsiteStatus::NotScanned).unwrap();
        assert_eq!(json, "\"Not Scanned\"");

        let status: WebsiteStatus = serde_json::from_str("\"Scanned\"").unwrap();
        assert_eq!(status, WebsiteStatus::Scanned);
    }

    #[test]
    fn test_task_state_wire_names() {
        let json = serde_json::to_string(&TaskState::Progress).unwrap();
        assert_eq!(json, "\"PROGRESS\"");

        let state: TaskState = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert!(state.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
    }

    #[test]
    fn test_website_deserializes_sparse_payload() {
        let site: Website = serde_json::from_str(
            r#"{"id": "w1", "url": "https://example.com", "status": "Not Scanned"}"#,
        )
        .unwrap();
        assert_eq!(site.id, WebsiteId::from("w1"));
        assert_eq!(site.status, WebsiteStatus::NotScanned);
        assert!(site.last_scanned_at.is_none());
        assert!(site.scan_results.is_none());
    }

    #[test]
    fn test_task_status_builder() {
        let status = TaskStatus::new(TaskState::Progress).with_message("Analyzing headers...");
        assert_eq!(status.state, TaskState::Progress);
        assert_eq!(
            status.progress_message.as_deref(),
            Some("Analyzing headers...")
        );
        assert!(status.website.is_none());
    }

    #[test]
    fn test_auth_token_redacted_in_debug() {
        let token = AuthToken::new("super-secret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
        assert!(token.authorization_header().ends_with("super-secret"));
    }
}
