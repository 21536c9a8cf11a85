//! The scan task registry: at most one live poll per website.
//!
//! The registry maps website ids to active poll handles and owns the
//! cancel-and-replace semantics: registering a poll for a website that
//! already has one cancels the old poll first, so starting a new scan
//! supersedes rather than duplicates the existing tracking.

use crate::coordinator::poller::PollHandle;
use crate::core::WebsiteId;

use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Mutex-serialized map from website id to its active poll handle.
#[derive(Debug, Default)]
pub struct ScanRegistry {
    active: Mutex<HashMap<WebsiteId, PollHandle>>,
}

impl ScanRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WebsiteId, PollHandle>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores a new poll handle, cancelling any existing poll for the same
    /// website first. Idempotent; never fails.
    pub(crate) fn register(&self, handle: PollHandle) {
        let website_id = handle.website_id().clone();
        let previous = self.lock().insert(website_id.clone(), handle);
        if let Some(previous) = previous {
            previous.stop();
            tracing::debug!(
                website_id = %website_id,
                task_id = %previous.task_id(),
                "superseded previous poll"
            );
        }
    }

    /// Cancels and removes the poll for the given website.
    ///
    /// Returns `true` if a poll was present; a missing entry is a no-op.
    pub fn cancel(&self, id: &WebsiteId) -> bool {
        match self.lock().remove(id) {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Cancels every active poll and returns how many were cancelled.
    /// Used at coordinator teardown.
    pub fn cancel_all(&self) -> usize {
        let handles: Vec<PollHandle> = self.lock().drain().map(|(_, handle)| handle).collect();
        for handle in &handles {
            handle.stop();
        }
        handles.len()
    }

    /// Returns whether a poll is currently running for this website.
    pub fn is_active(&self, id: &WebsiteId) -> bool {
        self.lock().get(id).is_some_and(PollHandle::is_running)
    }

    /// Returns the number of currently running polls.
    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|h| h.is_running()).count()
    }

    /// Removes the entry for a finished poll, but only if it is still the
    /// registered one. A poll superseded while its terminal report was in
    /// flight must not evict its replacement.
    ///
    /// Returns `true` when the given poll was the registered one. `false`
    /// means the report belongs to a superseded or already-removed poll
    /// and must be discarded by the caller.
    pub(crate) fn deregister(&self, id: &WebsiteId, poll_id: Uuid) -> bool {
        let mut map = self.lock();
        if map.get(id).is_some_and(|handle| handle.id() == poll_id) {
            map.remove(id);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockApi, MockTick};
    use crate::coordinator::poller::{PollState, TaskPoller};
    use crate::core::traits::PollObserver;
    use crate::core::{ArcApi, AuthToken, SentinelApi};
    use std::sync::{Arc, Weak};
    use std::time::Duration;

    #[derive(Debug)]
    struct SilentObserver;

    #[async_trait::async_trait]
    impl PollObserver for SilentObserver {
        async fn on_terminal(
            &self,
            _website_id: &WebsiteId,
            _poll_id: Uuid,
            _outcome: crate::coordinator::PollOutcome,
        ) {
        }
    }

    async fn running_handle(api: &Arc<MockApi>, observer: &Arc<SilentObserver>) -> PollHandle {
        let site = api.seed_website("https://example.com");
        api.push_script(vec![MockTick::Pending]);
        let token = AuthToken::new("mock-token");
        let started = api.begin_scan(&token, &site.id).await.unwrap();
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn PollObserver> = weak;
        TaskPoller::spawn(
            Arc::clone(api) as ArcApi,
            token,
            site.id,
            started.task_id,
            Duration::from_millis(5),
            weak,
        )
    }

    #[tokio::test]
    async fn test_register_supersedes_existing_poll() {
        let api = Arc::new(MockApi::new());
        let observer = Arc::new(SilentObserver);
        let registry = ScanRegistry::new();

        let first = running_handle(&api, &observer).await;
        let website_id = first.website_id().clone();
        registry.register(first.clone());

        // Second poll for the same website: the first must be cancelled.
        api.push_script(vec![MockTick::Pending]);
        let token = AuthToken::new("mock-token");
        let started = api.begin_scan(&token, &website_id).await.unwrap();
        let weak = Arc::downgrade(&observer);
        let weak: Weak<dyn PollObserver> = weak;
        let second = TaskPoller::spawn(
            Arc::clone(&api) as ArcApi,
            token,
            website_id.clone(),
            started.task_id,
            Duration::from_millis(5),
            weak,
        );
        registry.register(second.clone());

        assert_eq!(first.state(), PollState::StoppedCancelled);
        assert!(second.is_running());
        assert_eq!(registry.active_count(), 1);
        assert!(registry.is_active(&website_id));

        registry.cancel_all();
    }

    #[tokio::test]
    async fn test_cancel_is_a_no_op_when_absent() {
        let registry = ScanRegistry::new();
        assert!(!registry.cancel(&WebsiteId::from("missing")));
        assert!(!registry.is_active(&WebsiteId::from("missing")));
    }

    #[tokio::test]
    async fn test_cancel_all_stops_every_poll() {
        let api = Arc::new(MockApi::new());
        let observer = Arc::new(SilentObserver);
        let registry = ScanRegistry::new();

        let handles = vec![
            running_handle(&api, &observer).await,
            running_handle(&api, &observer).await,
            running_handle(&api, &observer).await,
        ];
        for handle in &handles {
            registry.register(handle.clone());
        }
        assert_eq!(registry.active_count(), 3);

        assert_eq!(registry.cancel_all(), 3);
        assert_eq!(registry.active_count(), 0);
        for handle in &handles {
            assert_eq!(handle.state(), PollState::StoppedCancelled);
        }
    }

    #[tokio::test]
    async fn test_deregister_only_removes_matching_poll() {
        let api = Arc::new(MockApi::new());
        let observer = Arc::new(SilentObserver);
        let registry = ScanRegistry::new();

        let first = running_handle(&api, &observer).await;
        let website_id = first.website_id().clone();
        let stale_id = first.id();
        registry.register(first);

        let second = running_handle(&api, &observer).await;
        // Re-key the second poll under the same website to model a
        // supersede, then try to deregister with the stale poll id.
        let replacement = PollHandle::clone(&second);
        registry.lock().insert(website_id.clone(), replacement);

        assert!(!registry.deregister(&website_id, stale_id));
        assert!(registry.is_active(&website_id));

        assert!(registry.deregister(&website_id, second.id()));
        assert!(!registry.is_active(&website_id));

        registry.cancel_all();
    }
}
