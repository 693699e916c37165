//! Idempotent remote key-value synchronization.
//!
//! [`VariableSync`] ensures a named remote variable matches a desired
//! value with the minimum number of network calls: one memoized full
//! listing per synchronizer instance decides between create and update,
//! and a create that collides with an out-of-band copy of the key is
//! reconciled by retrying as an update against the identifier reported
//! in the conflict.

use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::debug;

/// Desired state of a single remote variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    /// The logical key.
    pub key: String,
    /// The value to store.
    pub value: String,
    /// Whether the provider should mask the value.
    pub secured: bool,
}

impl VariableSpec {
    /// Creates a new variable spec.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, secured: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            secured,
        }
    }
}

/// One page of a remote variable listing.
#[derive(Debug, Clone, Default)]
pub struct VariablePage {
    /// `(key, remote identifier)` pairs on this page.
    pub entries: Vec<(String, String)>,
    /// Opaque cursor for the next page, absent on the last page.
    pub next: Option<String>,
}

/// The result of a create attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The variable was created.
    Created,
    /// The key already existed remotely; the provider reported the
    /// existing resource's identifier.
    Conflict {
        /// Identifier of the conflicting resource.
        existing_id: String,
    },
}

/// A remote collection of key-value variables.
///
/// Implementations map provider responses onto this contract: a
/// resolvable create conflict becomes [`CreateOutcome::Conflict`]; a
/// conflict whose body cannot be interpreted must be an error, never
/// silently swallowed.
#[async_trait]
pub trait VariableStore: Send + Sync {
    /// Fetches one page of the listing; `cursor` is the previous page's
    /// `next` value, `None` for the first page.
    async fn list_page(&self, cursor: Option<&str>) -> Result<VariablePage>;

    /// Creates a variable.
    async fn create(&self, spec: &VariableSpec) -> Result<CreateOutcome>;

    /// Updates a variable by its remote identifier.
    async fn update(&self, id: &str, spec: &VariableSpec) -> Result<()>;
}

/// Create-or-update synchronizer over one remote collection.
///
/// The listing is fetched at most once per instance; concurrent
/// `ensure` calls share the single in-flight fetch. One instance per
/// collection: repository-level and per-environment collections cache
/// independently.
pub struct VariableSync<S: VariableStore> {
    store: S,
    listing: OnceCell<HashMap<String, String>>,
}

impl<S: VariableStore> VariableSync<S> {
    /// Creates a synchronizer over `store` with an unpopulated cache.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            listing: OnceCell::new(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ensures the remote variable `key` holds `value`.
    ///
    /// Updates in place when the memoized listing knows the key,
    /// creates otherwise, and reconciles a create conflict as an update
    /// against the identifier the conflict reported.
    pub async fn ensure(&self, key: &str, value: &str, secured: bool) -> Result<()> {
        let spec = VariableSpec::new(key, value, secured);
        let listing = self
            .listing
            .get_or_try_init(|| self.fetch_listing())
            .await?;

        if let Some(id) = listing.get(key) {
            debug!(key, id, "variable known, updating");
            return self.store.update(id, &spec).await;
        }

        match self.store.create(&spec).await? {
            CreateOutcome::Created => Ok(()),
            CreateOutcome::Conflict { existing_id } => {
                // The cache was stale or another process won the race;
                // retarget as an update rather than failing the run.
                debug!(key, existing_id, "create conflicted, updating existing");
                self.store.update(&existing_id, &spec).await
            }
        }
    }

    async fn fetch_listing(&self) -> Result<HashMap<String, String>> {
        let mut merged = HashMap::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.store.list_page(cursor.as_deref()).await?;
            // Last write wins on duplicate keys across pages.
            merged.extend(page.entries);

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(entries = merged.len(), "variable listing populated");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LaunchpadError;
    use crate::testing::MemoryVariableStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn distinct_new_keys_create_once_each_with_one_listing() {
        let store = MemoryVariableStore::default();
        let sync = VariableSync::new(store);

        sync.ensure("A", "1", false).await.unwrap();
        sync.ensure("B", "2", true).await.unwrap();
        sync.ensure("C", "3", false).await.unwrap();

        let store = sync.store();
        assert_eq!(store.list_calls(), 1);
        assert_eq!(store.create_calls(), 3);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn existing_key_updates_by_remote_identifier() {
        let store = MemoryVariableStore::default();
        store.seed("API_KEY", "uuid-1");
        let sync = VariableSync::new(store);

        sync.ensure("API_KEY", "abc123", true).await.unwrap();

        let store = sync.store();
        assert_eq!(store.create_calls(), 0);
        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.last_update_id().as_deref(), Some("uuid-1"));
    }

    #[tokio::test]
    async fn create_conflict_reconciles_as_update() {
        let store = MemoryVariableStore::default();
        store.conflict_on_create("xyz");
        let sync = VariableSync::new(store);

        sync.ensure("API_KEY", "abc123", true).await.unwrap();

        let store = sync.store();
        assert_eq!(store.create_calls(), 1);
        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.last_update_id().as_deref(), Some("xyz"));
        assert_eq!(
            store.last_update_spec(),
            Some(VariableSpec::new("API_KEY", "abc123", true))
        );
    }

    #[tokio::test]
    async fn unresolvable_conflict_fails_without_update() {
        let store = MemoryVariableStore::default();
        store.fail_create_with(|| LaunchpadError::UnresolvedConflict {
            key: "API_KEY".to_string(),
            detail: "conflict body missing externalId".to_string(),
        });
        let sync = VariableSync::new(store);

        let err = sync.ensure("API_KEY", "abc123", true).await.unwrap_err();
        assert!(matches!(err, LaunchpadError::UnresolvedConflict { .. }));
        assert_eq!(sync.store().update_calls(), 0);
    }

    #[tokio::test]
    async fn listing_drains_all_pages_and_merges_entries() {
        let store = MemoryVariableStore::default();
        store.seed_paged(vec![
            vec![("A", "id-a"), ("B", "id-b")],
            vec![("C", "id-c")],
            vec![("D", "id-d")],
        ]);
        let sync = VariableSync::new(store);

        sync.ensure("D", "4", false).await.unwrap();

        let store = sync.store();
        assert_eq!(store.list_calls(), 3);
        assert_eq!(store.create_calls(), 0);
        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.last_update_id().as_deref(), Some("id-d"));
    }

    #[tokio::test]
    async fn concurrent_ensures_share_one_in_flight_listing() {
        let store = MemoryVariableStore::default();
        store.delay_listing(std::time::Duration::from_millis(20));
        let sync = Arc::new(VariableSync::new(store));

        let calls = (0..4).map(|i| {
            let sync = Arc::clone(&sync);
            tokio::spawn(async move {
                sync.ensure(&format!("K{i}"), "v", false).await
            })
        });
        for handle in calls {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(sync.store().list_calls(), 1);
        assert_eq!(sync.store().create_calls(), 4);
    }

    #[tokio::test]
    async fn stale_cache_conflict_scenario() {
        // First ensure creates the key; the provider now has it but the
        // cache still says it does not exist. The second ensure must
        // recover via the conflict identifier without re-listing.
        let store = MemoryVariableStore::default();
        store.conflict_on_second_create("xyz");
        let sync = VariableSync::new(store);

        sync.ensure("API_KEY", "abc123", true).await.unwrap();
        sync.ensure("API_KEY", "abc123", true).await.unwrap();

        let store = sync.store();
        assert_eq!(store.list_calls(), 1);
        assert_eq!(store.create_calls(), 2);
        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.last_update_id().as_deref(), Some("xyz"));
    }
}
