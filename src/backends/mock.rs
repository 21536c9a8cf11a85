//! Mock backend for testing.
//!
//! This module provides a configurable in-memory backend that stands in
//! for the Sentinel REST API, so coordinator and poller behavior can be
//! exercised without a server. Scan tasks play back scripted state
//! sequences, tick by tick.

use crate::core::{
    ApiError, AuthToken, Credentials, ScanStarted, SentinelApi, TaskState, TaskStatus, Website,
    WebsiteId, WebsiteStatus,
};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// One scripted observation of a mock scan task.
///
/// A script is a sequence of ticks; each `task_status` call consumes the
/// next one. The final tick repeats forever, so terminal states are
/// absorbing and a `Pending`-only script polls indefinitely.
#[derive(Debug, Clone)]
pub enum MockTick {
    /// Report the task as accepted but not started.
    Pending,
    /// Report progress with the given message.
    Progress(String),
    /// Report success with the given final website payload.
    Succeed(Website),
    /// Report success without a website payload, modelling a backend
    /// whose status response omits the final entity.
    SucceedWithoutPayload,
    /// Report failure with the given message.
    Fail(String),
    /// Fail the status query itself with the given error.
    Error(ApiError),
}

/// A scripted, in-memory stand-in for the Sentinel backend.
///
/// # Examples
///
/// ```rust
/// use sentinel_client::backends::{MockApi, MockTick};
///
/// let api = MockApi::new();
/// let site = api.seed_website("https://example.com");
///
/// // The next scan started against the backend will report progress
/// // twice and then succeed with the given payload.
/// let mut scanned = site.clone();
/// scanned.status = sentinel_client::WebsiteStatus::Scanned;
/// api.push_script(vec![
///     MockTick::Progress("Analyzing headers...".into()),
///     MockTick::Progress("Analyzing SSL/TLS...".into()),
///     MockTick::Succeed(scanned),
/// ]);
/// ```
#[derive(Debug, Default)]
pub struct MockApi {
    /// Authoritative backend copy of the websites.
    websites: Mutex<HashMap<WebsiteId, Website>>,
    /// Active scripts keyed by issued task id.
    scripts: Mutex<HashMap<String, VecDeque<MockTick>>>,
    /// Scripts waiting to be bound to the next started scans, in order.
    queued_scripts: Mutex<VecDeque<Vec<MockTick>>>,
    /// Error returned by every begin-scan call while set.
    begin_scan_error: Mutex<Option<ApiError>>,
    /// Error returned by login/register while set.
    auth_error: Mutex<Option<ApiError>>,
    /// Artificial latency applied to every status query.
    status_delay: Mutex<Option<Duration>>,
    begin_calls: AtomicU64,
    status_calls: AtomicU64,
    next_task: AtomicU64,
}

impl MockApi {
    /// Creates an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a script for the next started scan (builder form).
    pub fn with_script(self, script: Vec<MockTick>) -> Self {
        self.push_script(script);
        self
    }

    /// Queues a script for the next started scan.
    pub fn push_script(&self, script: Vec<MockTick>) {
        self.queued_scripts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(script);
    }

    /// Registers a website directly in the backend and returns it.
    pub fn seed_website(&self, url: impl Into<String>) -> Website {
        let site = Website::new(Uuid::new_v4().to_string(), url);
        self.websites
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(site.id.clone(), site.clone());
        site
    }

    /// Makes every begin-scan call fail with the given error until cleared.
    pub fn set_begin_scan_error(&self, error: Option<ApiError>) {
        *self
            .begin_scan_error
            .lock()
            .unwrap_or_else(|p| p.into_inner()) = error;
    }

    /// Makes login and register fail with the given error until cleared.
    pub fn set_auth_error(&self, error: Option<ApiError>) {
        *self.auth_error.lock().unwrap_or_else(|p| p.into_inner()) = error;
    }

    /// Delays every status query by the given duration.
    ///
    /// Used to widen the window between a query being dispatched and its
    /// response resolving, e.g. to exercise stale-response discards.
    pub fn set_status_delay(&self, delay: Option<Duration>) {
        *self.status_delay.lock().unwrap_or_else(|p| p.into_inner()) = delay;
    }

    /// Returns how many begin-scan calls were made.
    pub fn begin_calls(&self) -> u64 {
        self.begin_calls.load(Ordering::Relaxed)
    }

    /// Returns how many status queries were made.
    pub fn status_calls(&self) -> u64 {
        self.status_calls.load(Ordering::Relaxed)
    }

    fn make_token() -> AuthToken {
        AuthToken::new("mock-token")
    }

    fn authenticate(&self) -> Result<AuthToken, ApiError> {
        if let Some(err) = self
            .auth_error
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
        {
            return Err(err);
        }
        Ok(Self::make_token())
    }

    /// Default script when none was queued: a single immediate success
    /// with the backend's current payload marked scanned.
    fn default_script(&self, id: &WebsiteId) -> Vec<MockTick> {
        let mut site = self
            .websites
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned()
            .unwrap_or_else(|| Website::new(id.clone(), "https://unknown.example"));
        site.status = WebsiteStatus::Scanned;
        site.scan_results = Some(Vec::new());
        vec![MockTick::Succeed(site)]
    }
}

#[async_trait]
impl SentinelApi for MockApi {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.authenticate()
    }

    async fn register(&self, _credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.authenticate()
    }

    async fn list_websites(&self, _token: &AuthToken) -> Result<Vec<Website>, ApiError> {
        let mut sites: Vec<Website> = self
            .websites
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .cloned()
            .collect();
        sites.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(sites)
    }

    async fn add_website(&self, _token: &AuthToken, url: &str) -> Result<Website, ApiError> {
        Ok(self.seed_website(url))
    }

    async fn begin_scan(
        &self,
        _token: &AuthToken,
        id: &WebsiteId,
    ) -> Result<ScanStarted, ApiError> {
        self.begin_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = self
            .begin_scan_error
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
        {
            return Err(err);
        }

        let snapshot = {
            let mut websites = self.websites.lock().unwrap_or_else(|p| p.into_inner());
            let site = websites
                .get_mut(id)
                .ok_or_else(|| ApiError::not_found(format!("website {id}")))?;
            site.status = WebsiteStatus::Pending;
            site.clone()
        };

        let task_id = format!("task-{}", self.next_task.fetch_add(1, Ordering::Relaxed) + 1);
        let script = self
            .queued_scripts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.default_script(id));
        self.scripts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(task_id.clone(), script.into());

        Ok(ScanStarted {
            task_id,
            website: snapshot,
        })
    }

    async fn task_status(
        &self,
        _token: &AuthToken,
        task_id: &str,
    ) -> Result<TaskStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);

        let delay = *self.status_delay.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let tick = {
            let mut scripts = self.scripts.lock().unwrap_or_else(|p| p.into_inner());
            let script = scripts
                .get_mut(task_id)
                .ok_or_else(|| ApiError::not_found(format!("task {task_id}")))?;
            // The last tick repeats, keeping terminal states absorbing.
            if script.len() > 1 {
                script.pop_front().unwrap_or(MockTick::Pending)
            } else {
                script.front().cloned().unwrap_or(MockTick::Pending)
            }
        };

        match tick {
            MockTick::Pending => Ok(TaskStatus::new(TaskState::Pending)),
            MockTick::Progress(message) => {
                Ok(TaskStatus::new(TaskState::Progress).with_message(message))
            }
            MockTick::Succeed(site) => {
                self.websites
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .insert(site.id.clone(), site.clone());
                Ok(TaskStatus::new(TaskState::Success).with_website(site))
            }
            MockTick::SucceedWithoutPayload => Ok(TaskStatus::new(TaskState::Success)),
            MockTick::Fail(message) => Ok(TaskStatus::new(TaskState::Failure).with_message(message)),
            MockTick::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> AuthToken {
        AuthToken::new("mock-token")
    }

    #[tokio::test]
    async fn test_scripted_sequence_plays_back_in_order() {
        let api = MockApi::new();
        let site = api.seed_website("https://example.com");

        let mut scanned = site.clone();
        scanned.status = WebsiteStatus::Scanned;
        scanned.scan_results = Some(Vec::new());
        api.push_script(vec![
            MockTick::Progress("Analyzing headers...".into()),
            MockTick::Succeed(scanned),
        ]);

        let started = api.begin_scan(&token(), &site.id).await.unwrap();
        assert_eq!(started.website.status, WebsiteStatus::Pending);

        let first = api.task_status(&token(), &started.task_id).await.unwrap();
        assert_eq!(first.state, TaskState::Progress);

        let second = api.task_status(&token(), &started.task_id).await.unwrap();
        assert_eq!(second.state, TaskState::Success);
        assert!(second.website.is_some());

        // Terminal tick repeats.
        let third = api.task_status(&token(), &started.task_id).await.unwrap();
        assert_eq!(third.state, TaskState::Success);
    }

    #[tokio::test]
    async fn test_begin_scan_error_injection() {
        let api = MockApi::new();
        let site = api.seed_website("https://example.com");
        api.set_begin_scan_error(Some(ApiError::backend("scan already running")));

        let err = api.begin_scan(&token(), &site.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Backend { .. }));
        assert_eq!(api.begin_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let api = MockApi::new();
        let err = api
            .begin_scan(&token(), &WebsiteId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err = api.task_status(&token(), "no-such-task").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_auth_error_injection() {
        let api = MockApi::new();
        api.set_auth_error(Some(ApiError::auth("invalid credentials")));
        let credentials = Credentials::new("user@example.com", "hunter2");
        assert!(api.login(&credentials).await.is_err());

        api.set_auth_error(None);
        assert!(api.login(&credentials).await.is_ok());
    }
}
