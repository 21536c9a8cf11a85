//! The scan coordinator: public entry point tying scans, polls, and
//! merges together.

use crate::coordinator::poller::{PollOutcome, TaskPoller, DEFAULT_POLL_INTERVAL};
use crate::coordinator::registry::ScanRegistry;
use crate::core::traits::PollObserver;
use crate::core::{
    ApiError, ApiResult, ArcApi, ArcSink, AuthToken, Credentials, ScanTask, SentinelApi, Website,
    WebsiteId, WebsiteStore,
};
use crate::notify::{Notification, TracingSink};

use async_trait::async_trait;
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Configuration for the scan coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Cadence between task status queries.
    pub poll_interval: Duration,

    /// Whether backend progress messages are forwarded to the
    /// notification sink (they are always traced).
    pub progress_notifications: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            progress_notifications: true,
        }
    }
}

impl CoordinatorConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enables or disables progress notifications.
    pub fn with_progress_notifications(mut self, enabled: bool) -> Self {
        self.progress_notifications = enabled;
        self
    }
}

/// Builder for creating a [`ScanCoordinator`].
pub struct ScanCoordinatorBuilder {
    api: Option<ArcApi>,
    sink: Option<ArcSink>,
    config: CoordinatorConfig,
}

impl ScanCoordinatorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            api: None,
            sink: None,
            config: CoordinatorConfig::default(),
        }
    }

    /// Sets the backend API implementation.
    pub fn with_api<A: SentinelApi + 'static>(mut self, api: A) -> Self {
        self.api = Some(Arc::new(api));
        self
    }

    /// Sets a backend API already wrapped in an `Arc`.
    pub fn with_arc_api(mut self, api: ArcApi) -> Self {
        self.api = Some(api);
        self
    }

    /// Sets the notification sink.
    pub fn with_sink<S: crate::core::NotificationSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets a notification sink already wrapped in an `Arc`.
    pub fn with_shared_sink(mut self, sink: ArcSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the coordinator.
    pub fn build(self) -> Result<ScanCoordinator, ApiError> {
        let api = self
            .api
            .ok_or_else(|| ApiError::configuration("a backend API is required"))?;

        Ok(ScanCoordinator {
            api,
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink::new())),
            store: WebsiteStore::new(),
            registry: ScanRegistry::new(),
            session: RwLock::new(None),
            config: self.config,
        })
    }
}

impl Default for ScanCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates scan initiation, polling, and result merges.
///
/// The coordinator owns the website mirror and the poll registry; every
/// status transition of a monitored website flows through it. Instances
/// are self-contained: construct one per owning context and call
/// [`teardown`](Self::teardown) when that context goes away, which
/// guarantees that no polling task outlives its owner.
pub struct ScanCoordinator {
    api: ArcApi,
    sink: ArcSink,
    store: WebsiteStore,
    registry: ScanRegistry,
    session: RwLock<Option<AuthToken>>,
    config: CoordinatorConfig,
}

impl ScanCoordinator {
    /// Creates a new builder.
    pub fn builder() -> ScanCoordinatorBuilder {
        ScanCoordinatorBuilder::new()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Returns a reference to the poll registry.
    pub fn registry(&self) -> &ScanRegistry {
        &self.registry
    }

    /// Returns `true` if a session token is held.
    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    fn session_token(&self) -> ApiResult<AuthToken> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| ApiError::auth("no authenticated session"))
    }

    fn set_session(&self, token: Option<AuthToken>) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    /// Authenticates an existing account and mirrors the website list.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<()> {
        let token = self.api.login(credentials).await?;
        self.set_session(Some(token));
        self.refresh_websites().await?;
        self.sink
            .notify(Notification::success("Successfully logged in!"));
        tracing::info!(email = %credentials.email, "session established");
        Ok(())
    }

    /// Creates a new account and mirrors the (empty) website list.
    pub async fn register(&self, credentials: &Credentials) -> ApiResult<()> {
        let token = self.api.register(credentials).await?;
        self.set_session(Some(token));
        self.refresh_websites().await?;
        self.sink
            .notify(Notification::success("Successfully registered!"));
        tracing::info!(email = %credentials.email, "account created");
        Ok(())
    }

    /// Drops the session token and the local website mirror.
    ///
    /// In-flight polls are not cancelled here; they will fail on their
    /// next tick's auth check server-side, or can be cancelled explicitly
    /// via [`teardown`](Self::teardown).
    pub fn logout(&self) {
        self.set_session(None);
        self.store.clear();
        self.sink
            .notify(Notification::info("You have been logged out."));
    }

    /// Re-fetches the authoritative website list and replaces the mirror.
    pub async fn refresh_websites(&self) -> ApiResult<()> {
        let token = self.session_token()?;
        let sites = self.api.list_websites(&token).await?;
        tracing::debug!(count = sites.len(), "website list refreshed");
        self.store.replace_all(sites);
        Ok(())
    }

    /// Registers a new website for monitoring.
    pub async fn add_website(&self, url: &str) -> ApiResult<Website> {
        let token = self.session_token()?;
        let site = self.api.add_website(&token, url).await?;
        self.store.upsert(site.clone());
        self.sink
            .notify(Notification::success("Website added successfully!"));
        tracing::info!(website_id = %site.id, url = %site.url, "website added");
        Ok(site)
    }

    /// Returns the mirrored websites in display order.
    pub fn websites(&self) -> Vec<Website> {
        self.store.list()
    }

    /// Returns the mirrored state of one website.
    pub fn website(&self, id: &WebsiteId) -> Option<Website> {
        self.store.get(id)
    }

    /// Returns whether a scan is currently being tracked for this website.
    pub fn is_scanning(&self, id: &WebsiteId) -> bool {
        self.registry.is_active(id)
    }

    /// Returns the number of scans currently being tracked.
    pub fn active_polls(&self) -> usize {
        self.registry.active_count()
    }

    /// Starts a scan for the given website and begins tracking it.
    ///
    /// On success the backend's immediate snapshot (typically `Pending`)
    /// is merged into the mirror before this method returns, and a poller
    /// is registered, superseding any prior poll for the same website.
    /// The call does not wait for the scan to finish.
    ///
    /// On a begin-scan failure no poller is created and the website's
    /// prior status is left untouched.
    pub async fn start_scan(self: &Arc<Self>, id: &WebsiteId) -> ApiResult<()> {
        let token = self.session_token()?;

        let started = match self.api.begin_scan(&token, id).await {
            Ok(started) => started,
            Err(error) => {
                tracing::warn!(website_id = %id, error = %error, "begin scan rejected");
                self.sink.notify(Notification::error(format!(
                    "Failed to start scan: {error}"
                )));
                return Err(error);
            }
        };

        self.store.merge_snapshot(&started.website);

        let weak = Arc::downgrade(self);
        let observer: Weak<dyn PollObserver> = weak;
        let handle = TaskPoller::spawn(
            Arc::clone(&self.api),
            token,
            id.clone(),
            started.task_id.clone(),
            self.config.poll_interval,
            observer,
        );
        self.registry.register(handle);

        tracing::info!(website_id = %id, task_id = %started.task_id, "scan started");
        Ok(())
    }

    /// Starts a scan for every known website without an active poll.
    ///
    /// Individual begin-scan failures are surfaced through the sink and
    /// skipped; the batch continues. Returns how many scans were started.
    pub async fn start_all_scans(self: &Arc<Self>) -> usize {
        let mut started = 0;
        for site in self.store.list() {
            if self.registry.is_active(&site.id) {
                continue;
            }
            // start_scan already surfaced the failure; skip and continue.
            if self.start_scan(&site.id).await.is_ok() {
                started += 1;
            }
        }
        tracing::info!(started, "bulk scan initiated");
        started
    }

    /// Cancels every active poll.
    ///
    /// Must be called when the coordinator's owning context is destroyed;
    /// afterwards no polling task remains, regardless of how many scans
    /// were in flight.
    pub fn teardown(&self) {
        let cancelled = self.registry.cancel_all();
        tracing::info!(cancelled, "coordinator teardown");
    }

    /// Merges a missing-payload success by re-fetching the authoritative
    /// list. Returns the scanned site's URL for the notification.
    async fn refetch_scanned(&self, id: &WebsiteId) -> ApiResult<String> {
        let token = self.session_token()?;
        let sites = self.api.list_websites(&token).await?;
        let site = sites
            .into_iter()
            .find(|site| &site.id == id)
            .ok_or_else(|| ApiError::not_found(format!("website {id}")))?;
        let url = site.url.clone();
        self.store.merge_scanned(site);
        Ok(url)
    }
}

#[async_trait]
impl PollObserver for ScanCoordinator {
    async fn on_progress(&self, task: &ScanTask) {
        if self.config.progress_notifications {
            if let Some(message) = &task.progress_message {
                self.sink.notify(Notification::info(message.clone()));
            }
        }
    }

    async fn on_terminal(&self, website_id: &WebsiteId, poll_id: Uuid, outcome: PollOutcome) {
        // Only the currently registered poll may report; a report from a
        // superseded or already-removed poll is discarded unapplied, so it
        // cannot clobber the state of the scan that replaced it.
        if !self.registry.deregister(website_id, poll_id) {
            tracing::debug!(
                website_id = %website_id,
                poll_id = %poll_id,
                "discarding terminal report from a superseded poll"
            );
            return;
        }

        match outcome {
            PollOutcome::Success {
                website: Some(site),
            } => {
                let url = site.url.clone();
                self.store.merge_scanned(site);
                self.sink
                    .notify(Notification::success(format!("Scan complete for {url}")));
                tracing::info!(website_id = %website_id, "scan results merged");
            }
            PollOutcome::Success { website: None } => {
                // Status response carried no payload; fall back to the
                // authoritative list.
                match self.refetch_scanned(website_id).await {
                    Ok(url) => {
                        self.sink
                            .notify(Notification::success(format!("Scan complete for {url}")));
                    }
                    Err(error) => {
                        self.store.merge_error(website_id);
                        self.sink.notify(Notification::error(format!(
                            "Scan finished but results could not be fetched: {error}"
                        )));
                        tracing::warn!(
                            website_id = %website_id,
                            error = %error,
                            "failed to fetch final scan payload"
                        );
                    }
                }
            }
            PollOutcome::Failure { message } => {
                self.store.merge_error(website_id);
                let detail = message.unwrap_or_else(|| "scan failed".to_string());
                self.sink
                    .notify(Notification::error(format!("Scan failed: {detail}")));
                tracing::warn!(website_id = %website_id, detail = %detail, "scan failed");
            }
            PollOutcome::TickFailed { error } => {
                self.store.merge_error(website_id);
                self.sink.notify(Notification::error(format!(
                    "Lost track of scan: {error}"
                )));
            }
        }
    }
}

impl Drop for ScanCoordinator {
    fn drop(&mut self) {
        self.registry.cancel_all();
    }
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("websites", &self.store.len())
            .field("active_polls", &self.registry.active_count())
            .field("config", &self.config)
            .finish()
    }
}
