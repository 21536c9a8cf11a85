//! Client-side mirror of the monitored website collection.
//!
//! The authoritative copy of every website lives on the backend. The store
//! holds the locally mirrored state and is mutated only through the narrow
//! merge operations the coordinator drives; no other component writes to it.

use crate::core::types::{Website, WebsiteId, WebsiteStatus};

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// Shared, mutex-serialized collection of monitored websites.
///
/// Reads are public; every mutation is `pub(crate)` so that status
/// transitions can only happen through coordinator-issued merges.
#[derive(Debug, Default)]
pub struct WebsiteStore {
    inner: Mutex<HashMap<WebsiteId, Website>>,
}

impl WebsiteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WebsiteId, Website>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the website with the given id, if known.
    pub fn get(&self, id: &WebsiteId) -> Option<Website> {
        self.lock().get(id).cloned()
    }

    /// Returns all known websites in a stable display order (by URL).
    pub fn list(&self) -> Vec<Website> {
        let mut sites: Vec<Website> = self.lock().values().cloned().collect();
        sites.sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        sites
    }

    /// Returns the number of known websites.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no websites are known.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` if the given id is known.
    pub fn contains(&self, id: &WebsiteId) -> bool {
        self.lock().contains_key(id)
    }

    /// Replaces the entire mirror with a freshly fetched list.
    pub(crate) fn replace_all(&self, sites: Vec<Website>) {
        let mut map = self.lock();
        map.clear();
        for site in sites {
            map.insert(site.id.clone(), site);
        }
    }

    /// Inserts or overwrites a single website entry.
    pub(crate) fn upsert(&self, site: Website) {
        self.lock().insert(site.id.clone(), site);
    }

    /// Removes every entry, used on logout.
    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    /// Merges an intermediate snapshot, as returned by begin-scan.
    ///
    /// Only the status is taken from the snapshot; previously known scan
    /// results and the last-scanned timestamp survive so that an in-flight
    /// scan does not erase the last good result set. Unknown ids are
    /// inserted as-is.
    pub(crate) fn merge_snapshot(&self, snapshot: &Website) {
        let mut map = self.lock();
        match map.get_mut(&snapshot.id) {
            Some(existing) => {
                existing.status = snapshot.status;
                existing.url = snapshot.url.clone();
            }
            None => {
                map.insert(snapshot.id.clone(), snapshot.clone());
            }
        }
    }

    /// Merges the authoritative final payload of a successful scan.
    ///
    /// Scan results are replaced wholesale. The last-scanned timestamp is
    /// taken from the payload, stamped with the current time when the
    /// payload omits it, and never moves backwards.
    pub(crate) fn merge_scanned(&self, payload: Website) {
        let mut map = self.lock();
        let previous_scan = map.get(&payload.id).and_then(|w| w.last_scanned_at);

        let mut merged = payload;
        merged.status = WebsiteStatus::Scanned;
        let stamped = merged.last_scanned_at.unwrap_or_else(Utc::now);
        merged.last_scanned_at = Some(match previous_scan {
            Some(previous) if previous > stamped => previous,
            _ => stamped,
        });

        map.insert(merged.id.clone(), merged);
    }

    /// Merges a failed scan: status becomes `Error`, everything else is
    /// left untouched. No-op for unknown ids.
    pub(crate) fn merge_error(&self, id: &WebsiteId) {
        if let Some(existing) = self.lock().get_mut(id) {
            existing.status = WebsiteStatus::Error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CheckResult, CheckStatus};
    use chrono::Duration;

    fn scanned_site(id: &str, url: &str) -> Website {
        let mut site = Website::new(id, url);
        site.status = WebsiteStatus::Scanned;
        site.last_scanned_at = Some(Utc::now());
        site.scan_results = Some(vec![CheckResult::new(
            "HSTS",
            CheckStatus::Present,
            "max-age=31536000",
        )]);
        site
    }

    #[test]
    fn test_snapshot_merge_keeps_previous_results() {
        let store = WebsiteStore::new();
        let site = scanned_site("w1", "https://example.com");
        let last = site.last_scanned_at;
        store.upsert(site);

        let mut snapshot = Website::new("w1", "https://example.com");
        snapshot.status = WebsiteStatus::Pending;
        store.merge_snapshot(&snapshot);

        let merged = store.get(&WebsiteId::from("w1")).unwrap();
        assert_eq!(merged.status, WebsiteStatus::Pending);
        assert!(merged.scan_results.is_some());
        assert_eq!(merged.last_scanned_at, last);
    }

    #[test]
    fn test_snapshot_merge_inserts_unknown_site() {
        let store = WebsiteStore::new();
        let mut snapshot = Website::new("w2", "https://new.example");
        snapshot.status = WebsiteStatus::Pending;
        store.merge_snapshot(&snapshot);
        assert!(store.contains(&WebsiteId::from("w2")));
    }

    #[test]
    fn test_scanned_merge_replaces_results_wholesale() {
        let store = WebsiteStore::new();
        store.upsert(scanned_site("w1", "https://example.com"));

        let mut payload = Website::new("w1", "https://example.com");
        payload.status = WebsiteStatus::Scanned;
        payload.scan_results = Some(vec![
            CheckResult::new("CSP", CheckStatus::Missing, "header absent"),
        ]);
        store.merge_scanned(payload);

        let merged = store.get(&WebsiteId::from("w1")).unwrap();
        let results = merged.scan_results.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "CSP");
        assert!(merged.last_scanned_at.is_some());
    }

    #[test]
    fn test_scanned_merge_timestamp_never_regresses() {
        let store = WebsiteStore::new();
        let mut site = scanned_site("w1", "https://example.com");
        let future = Utc::now() + Duration::hours(1);
        site.last_scanned_at = Some(future);
        store.upsert(site);

        let mut payload = Website::new("w1", "https://example.com");
        payload.status = WebsiteStatus::Scanned;
        payload.scan_results = Some(vec![]);
        store.merge_scanned(payload);

        let merged = store.get(&WebsiteId::from("w1")).unwrap();
        assert_eq!(merged.last_scanned_at, Some(future));
    }

    #[test]
    fn test_error_merge_preserves_results() {
        let store = WebsiteStore::new();
        store.upsert(scanned_site("w1", "https://example.com"));

        store.merge_error(&WebsiteId::from("w1"));

        let merged = store.get(&WebsiteId::from("w1")).unwrap();
        assert_eq!(merged.status, WebsiteStatus::Error);
        assert!(merged.scan_results.is_some());

        // Unknown id is a no-op.
        store.merge_error(&WebsiteId::from("unknown"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_is_sorted_by_url() {
        let store = WebsiteStore::new();
        store.upsert(Website::new("b", "https://zzz.example"));
        store.upsert(Website::new("a", "https://aaa.example"));

        let urls: Vec<String> = store.list().into_iter().map(|w| w.url).collect();
        assert_eq!(urls, vec!["https://aaa.example", "https://zzz.example"]);
    }

    #[test]
    fn test_replace_all_and_clear() {
        let store = WebsiteStore::new();
        store.upsert(Website::new("old", "https://old.example"));
        store.replace_all(vec![Website::new("w1", "https://a.example")]);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&WebsiteId::from("old")));

        store.clear();
        assert!(store.is_empty());
    }
}
