//! The task poller: drives one scan task's repeated status queries.
//!
//! A poller is a spawned loop that queries the backend at a fixed interval
//! until the task reaches a terminal state, a query fails, or the poller
//! is cancelled from outside. Cancellation is immediate for future ticks,
//! and a query already in flight when `stop` is called has its response
//! discarded rather than applied.

use crate::core::traits::PollObserver;
use crate::core::{ApiError, ArcApi, AuthToken, ScanTask, TaskState, Website, WebsiteId};

use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default cadence between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Lifecycle state of a poller.
///
/// `Running` is the only state with outgoing transitions; every stopped
/// state is absorbing. Transitions happen only on tick boundaries or on
/// external cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// The poll loop is live and will query again.
    Running,
    /// The task reached `Success` or `Failure` and the loop ended.
    StoppedTerminal,
    /// The poller was cancelled externally (superseded or torn down).
    StoppedCancelled,
    /// A status query failed and the loop ended without a terminal task
    /// state.
    StoppedError,
}

impl PollState {
    /// Returns `true` for every state except `Running`.
    pub fn is_stopped(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Outcome a poller reports when it leaves the running state on its own.
///
/// Externally cancelled pollers report nothing.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The task succeeded; carries the final website payload if the
    /// backend included it in the status response.
    Success {
        /// Authoritative final website payload, if provided.
        website: Option<Website>,
    },
    /// The task failed server-side.
    Failure {
        /// Failure message reported by the backend, if any.
        message: Option<String>,
    },
    /// The status query itself failed; treated as fatal, never retried.
    TickFailed {
        /// The error returned by the query.
        error: ApiError,
    },
}

/// Cancellable handle to a running poller.
///
/// Handles are cheap to clone; all clones share the same state and
/// cancellation token. Stopping is idempotent, and stopping a poller that
/// already reached a terminal state is a no-op.
#[derive(Debug, Clone)]
pub struct PollHandle {
    id: Uuid,
    website_id: WebsiteId,
    task_id: String,
    cancel: CancellationToken,
    state: Arc<RwLock<PollState>>,
}

impl PollHandle {
    fn new(website_id: WebsiteId, task_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            website_id,
            task_id,
            cancel: CancellationToken::new(),
            state: Arc::new(RwLock::new(PollState::Running)),
        }
    }

    /// Unique id of this poll, distinguishing superseded polls for the
    /// same website.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The website this poll updates.
    pub fn website_id(&self) -> &WebsiteId {
        &self.website_id
    }

    /// The backend task being polled.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> PollState {
        *self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns `true` while the poll loop is live.
    pub fn is_running(&self) -> bool {
        self.state() == PollState::Running
    }

    /// Cancels the poller.
    ///
    /// No further ticks fire afterwards, and a response already in flight
    /// is discarded instead of reported. Safe to call any number of times
    /// and in any state.
    pub fn stop(&self) {
        self.cancel.cancel();
        self.transition(PollState::StoppedCancelled);
    }

    /// Moves out of `Running` exactly once; stopped states are absorbing.
    fn transition(&self, to: PollState) -> bool {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state == PollState::Running {
            *state = to;
            true
        } else {
            false
        }
    }
}

/// The poll loop for a single scan task.
pub(crate) struct TaskPoller {
    api: ArcApi,
    token: AuthToken,
    task: ScanTask,
    interval: Duration,
    observer: Weak<dyn PollObserver>,
    handle: PollHandle,
}

impl TaskPoller {
    /// Spawns the poll loop and returns its handle.
    ///
    /// The observer is held weakly: if the owner goes away the loop winds
    /// down silently instead of keeping it alive.
    pub(crate) fn spawn(
        api: ArcApi,
        token: AuthToken,
        website_id: WebsiteId,
        task_id: String,
        interval: Duration,
        observer: Weak<dyn PollObserver>,
    ) -> PollHandle {
        let handle = PollHandle::new(website_id.clone(), task_id.clone());
        let poller = Self {
            api,
            token,
            task: ScanTask::started(task_id, website_id),
            interval,
            observer,
            handle: handle.clone(),
        };
        tokio::spawn(poller.run());
        handle
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.handle.cancel.cancelled() => {
                    self.handle.transition(PollState::StoppedCancelled);
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            // At most one query is in flight per poller; the next tick is
            // only scheduled once this one settles.
            let queried = tokio::select! {
                _ = self.handle.cancel.cancelled() => None,
                result = self.api.task_status(&self.token, &self.task.task_id) => Some(result),
            };

            let Some(result) = queried else {
                self.handle.transition(PollState::StoppedCancelled);
                return;
            };

            if self.handle.cancel.is_cancelled() {
                // stop() raced the response; discard it unapplied.
                tracing::debug!(
                    website_id = %self.task.website_id,
                    task_id = %self.task.task_id,
                    "discarding stale poll response after cancellation"
                );
                self.handle.transition(PollState::StoppedCancelled);
                return;
            }

            let status = match result {
                Ok(status) => status,
                Err(error) => {
                    tracing::warn!(
                        website_id = %self.task.website_id,
                        task_id = %self.task.task_id,
                        error = %error,
                        "poll tick failed, aborting task tracking"
                    );
                    if self.handle.transition(PollState::StoppedError) {
                        self.report(PollOutcome::TickFailed { error }).await;
                    }
                    return;
                }
            };

            self.task.state = status.state;
            self.task.progress_message = status.progress_message.clone();

            match status.state {
                TaskState::Pending => {}
                TaskState::Progress => {
                    tracing::debug!(
                        website_id = %self.task.website_id,
                        task_id = %self.task.task_id,
                        message = ?self.task.progress_message,
                        "scan in progress"
                    );
                    if let Some(observer) = self.observer.upgrade() {
                        observer.on_progress(&self.task).await;
                    }
                }
                TaskState::Success => {
                    if self.handle.transition(PollState::StoppedTerminal) {
                        self.report(PollOutcome::Success {
                            website: status.website,
                        })
                        .await;
                    }
                    return;
                }
                TaskState::Failure => {
                    if self.handle.transition(PollState::StoppedTerminal) {
                        self.report(PollOutcome::Failure {
                            message: status.progress_message,
                        })
                        .await;
                    }
                    return;
                }
            }
        }
    }

    async fn report(&self, outcome: PollOutcome) {
        let Some(observer) = self.observer.upgrade() else {
            return;
        };
        observer
            .on_terminal(&self.task.website_id, self.handle.id, outcome)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockApi, MockTick};
    use crate::core::{SentinelApi, WebsiteStatus};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingObserver {
        progress: Mutex<Vec<ScanTask>>,
        terminals: Mutex<Vec<(WebsiteId, Uuid, PollOutcome)>>,
    }

    #[async_trait]
    impl PollObserver for RecordingObserver {
        async fn on_progress(&self, task: &ScanTask) {
            self.progress.lock().unwrap().push(task.clone());
        }

        async fn on_terminal(&self, website_id: &WebsiteId, poll_id: Uuid, outcome: PollOutcome) {
            self.terminals
                .lock()
                .unwrap()
                .push((website_id.clone(), poll_id, outcome));
        }
    }

    fn token() -> AuthToken {
        AuthToken::new("mock-token")
    }

    async fn start_scripted(
        api: &Arc<MockApi>,
        script: Vec<MockTick>,
    ) -> (WebsiteId, String) {
        let site = api.seed_website("https://example.com");
        api.push_script(script);
        let started = api.begin_scan(&token(), &site.id).await.unwrap();
        (site.id, started.task_id)
    }

    fn spawn_poller(
        api: &Arc<MockApi>,
        observer: &Arc<RecordingObserver>,
        website_id: WebsiteId,
        task_id: String,
        interval: Duration,
    ) -> PollHandle {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn PollObserver> = weak;
        TaskPoller::spawn(
            Arc::clone(api) as ArcApi,
            token(),
            website_id,
            task_id,
            interval,
            weak,
        )
    }

    #[tokio::test]
    async fn test_terminal_state_is_absorbing() {
        let api = Arc::new(MockApi::new());
        let mut scanned = crate::core::Website::new("ignored", "https://example.com");
        scanned.status = WebsiteStatus::Scanned;
        scanned.scan_results = Some(Vec::new());

        let (website_id, task_id) = start_scripted(
            &api,
            vec![
                MockTick::Progress("Analyzing headers...".into()),
                MockTick::Succeed(scanned),
            ],
        )
        .await;

        let observer = Arc::new(RecordingObserver::default());
        let handle = spawn_poller(&api, &observer, website_id, task_id, Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.state(), PollState::StoppedTerminal);
        assert_eq!(observer.terminals.lock().unwrap().len(), 1);
        assert_eq!(observer.progress.lock().unwrap().len(), 1);

        // No further ticks fire after the terminal state.
        let calls = api.status_calls();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(api.status_calls(), calls);
    }

    #[tokio::test]
    async fn test_stop_discards_in_flight_response() {
        let api = Arc::new(MockApi::new());
        api.set_status_delay(Some(Duration::from_millis(80)));
        let (website_id, task_id) = start_scripted(&api, vec![]).await;

        let observer = Arc::new(RecordingObserver::default());
        let handle = spawn_poller(&api, &observer, website_id, task_id, Duration::from_millis(5));

        // Let the first query get dispatched, then cancel while it is
        // still in flight.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(api.status_calls(), 1);
        handle.stop();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(handle.state(), PollState::StoppedCancelled);
        assert!(observer.terminals.lock().unwrap().is_empty());
        assert_eq!(api.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_poller_fatal() {
        let api = Arc::new(MockApi::new());
        let (website_id, task_id) = start_scripted(
            &api,
            vec![MockTick::Error(ApiError::request("connection reset"))],
        )
        .await;

        let observer = Arc::new(RecordingObserver::default());
        let handle = spawn_poller(&api, &observer, website_id, task_id, Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.state(), PollState::StoppedError);

        let terminals = observer.terminals.lock().unwrap();
        assert_eq!(terminals.len(), 1);
        assert!(matches!(terminals[0].2, PollOutcome::TickFailed { .. }));
        drop(terminals);

        // Fail-fast: exactly one query, no retries.
        assert_eq!(api.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_before_first_tick_prevents_queries() {
        let api = Arc::new(MockApi::new());
        let (website_id, task_id) =
            start_scripted(&api, vec![MockTick::Pending]).await;

        let observer = Arc::new(RecordingObserver::default());
        let handle = spawn_poller(
            &api,
            &observer,
            website_id,
            task_id,
            Duration::from_millis(500),
        );

        handle.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.state(), PollState::StoppedCancelled);
        assert_eq!(api.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_double_stop_is_a_safe_no_op() {
        let api = Arc::new(MockApi::new());
        let mut scanned = crate::core::Website::new("ignored", "https://example.com");
        scanned.status = WebsiteStatus::Scanned;
        let (website_id, task_id) =
            start_scripted(&api, vec![MockTick::Succeed(scanned)]).await;

        let observer = Arc::new(RecordingObserver::default());
        let handle = spawn_poller(&api, &observer, website_id, task_id, Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(handle.state(), PollState::StoppedTerminal);

        // Stopping after a terminal state does not overwrite it.
        handle.stop();
        handle.stop();
        assert_eq!(handle.state(), PollState::StoppedTerminal);
        assert_eq!(observer.terminals.lock().unwrap().len(), 1);
    }
}
