//! Layer Manager (C3)
//!
//! Owns an ordered stack of tiers — position 0 is the origin, higher
//! positions are progressively faster managed tiers — and implements
//! read-through promotion, watched-only delete, prefetch, and the
//! consistency watcher. Grounded directly on `manager.go`'s `Manager`
//! (`Get`/`Delete`/`PrefetchPrefixes`/`Watch`); the Rust shape (tier stack as
//! `Vec`, `tokio::spawn` for fire-and-forget work, `tracing` in place of the
//! Go `logger`) follows teacher's `cache/manager.rs` (`MultiTierCache`).

use crate::cache::entry::Object;
use crate::cache::storage::Store;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct Tier {
    name: String,
    store: Arc<dyn Store>,
    managed: bool,
}

/// The ordered stack of tiers plus the not-found fallback key.
///
/// The stack is immutable once reads begin — every [`Manager::add_layer`]
/// call must happen before the HTTP listener is bound, matching §5's "no
/// lock required on the read path" guarantee.
pub struct Manager {
    tiers: Vec<Tier>,
    fallback_key: Option<String>,
}

impl Manager {
    pub fn new(fallback_key: impl Into<String>) -> Self {
        let fallback_key = fallback_key.into();
        Self {
            tiers: Vec::new(),
            fallback_key: if fallback_key.is_empty() {
                None
            } else {
                Some(fallback_key)
            },
        }
    }

    /// Register a tier. The first tier registered is the origin by
    /// convention — `managed` should be `false` for it and `true` for every
    /// other tier. All layers must be added before the manager starts
    /// serving reads; per §4.3.5 bootstrap refuses to start with zero tiers
    /// (see [`Manager::tier_count`]).
    pub fn add_layer(&mut self, name: impl Into<String>, store: Arc<dyn Store>, managed: bool) {
        self.tiers.push(Tier {
            name: name.into(),
            store,
            managed,
        });
    }

    fn origin(&self) -> &Arc<dyn Store> {
        &self.tiers[0].store
    }

    /// List keys under `prefix` directly against the origin. Used by the
    /// HTTP frontend to expand `*`-suffixed keys in `/_many/` requests.
    pub async fn origin_list(&self, prefix: &str) -> Result<Vec<Object>> {
        self.origin().list(prefix).await
    }

    fn managed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.tiers.len()).filter(move |&i| self.tiers[i].managed)
    }

    /// Probe the stack top-down for `key`, promoting fire-and-forget into
    /// every tier above the hit. No fallback-key handling here — that's a
    /// single bounded redirect layered on top in [`Manager::get`].
    async fn probe(&self, key: &str) -> Result<Object> {
        for i in (0..self.tiers.len()).rev() {
            match self.tiers[i].store.get(key).await {
                Ok(object) => {
                    tracing::info!(tier = %self.tiers[i].name, key, "hit");
                    self.promote(i, object.clone());
                    return Ok(object);
                }
                Err(Error::NotFound) => {
                    tracing::warn!(tier = %self.tiers[i].name, key, "miss");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::NotFound)
    }

    /// §4.3.1 read path: probe top-down; on a full miss, redirect once to
    /// the configured fallback key if it differs from the requested key.
    pub async fn get(&self, key: &str) -> Result<Object> {
        match self.probe(key).await {
            Err(Error::NotFound) => match &self.fallback_key {
                Some(fallback) if fallback != key => self.probe(fallback).await,
                _ => Err(Error::NotFound),
            },
            other => other,
        }
    }

    /// Fire-and-forget `Set` into every tier above position `hit_index`.
    fn promote(&self, hit_index: usize, object: Object) {
        for i in (hit_index + 1)..self.tiers.len() {
            let store = self.tiers[i].store.clone();
            let name = self.tiers[i].name.clone();
            let object = object.clone();
            let key = object.key.clone();
            tokio::spawn(async move {
                if let Err(e) = store.set(object).await {
                    tracing::warn!(tier = %name, key, error = %e, "promotion failed");
                }
            });
        }
    }

    /// §4.3.2 delete path: top-down, restricted to managed tiers when
    /// `watched_only`, returns on the first non-NotFound result.
    pub async fn delete(&self, key: &str, watched_only: bool) -> Result<()> {
        let indices: Vec<usize> = if watched_only {
            self.managed_indices().collect()
        } else {
            (0..self.tiers.len()).collect()
        };

        for &i in indices.iter().rev() {
            match self.tiers[i].store.delete(key).await {
                Err(Error::NotFound) => continue,
                other => return other,
            }
        }
        Ok(())
    }

    /// §4.3.3 prefetch: enumerate origin keys under `prefix`, fire one
    /// uncoordinated `Get` per key. No back-pressure, per §5.
    pub async fn prefetch_prefix(self: &Arc<Self>, prefix: &str) {
        let files = match self.origin().list(prefix).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(prefix, error = %e, "prefetch list failed");
                return;
            }
        };
        for file in files {
            let manager = self.clone();
            let key = file.key;
            tokio::spawn(async move {
                if let Err(e) = manager.get(&key).await {
                    tracing::warn!(key, error = %e, "prefetch get failed");
                }
            });
        }
    }

    /// §4.3.4 consistency watcher: one reconciliation tick.
    async fn watch_tick(&self) -> Result<()> {
        // 1. oldest copy of each key across managed tiers.
        let mut oldest: HashMap<String, Object> = HashMap::new();
        for i in self.managed_indices() {
            let files = self.tiers[i].store.list("").await?;
            for file in files {
                match oldest.get(&file.key) {
                    Some(existing) if existing.mtime.unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC) <= file.mtime.unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC) => {}
                    _ => {
                        oldest.insert(file.key.clone(), file);
                    }
                }
            }
        }

        // 2. groups to query against the origin.
        let mut groups: std::collections::HashSet<String> = std::collections::HashSet::new();
        for key in oldest.keys() {
            groups.insert(key.split('/').next().unwrap_or(key).to_string());
        }

        // 3. list each group against the origin.
        let mut root_files: HashMap<String, Object> = HashMap::new();
        for group in groups {
            match self.origin().list(&group).await {
                Ok(files) => {
                    for f in files {
                        root_files.insert(f.key.clone(), f);
                    }
                }
                Err(e) => {
                    tracing::warn!(group, error = %e, "watcher group list failed");
                    continue;
                }
            }
        }

        // 4. reconcile.
        for (key, old_file) in &oldest {
            match root_files.get(key) {
                None => {
                    tracing::debug!(key, "watcher: deleting key removed at origin");
                    let _ = self.delete(key, true).await;
                }
                Some(root_file) => {
                    let root_mtime = root_file.mtime.unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
                    let old_mtime = old_file.mtime.unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
                    if root_mtime > old_mtime {
                        tracing::debug!(key, "watcher: refreshing key updated at origin");
                        let _ = self.delete(key, true).await;
                        let _ = self.get(key).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Run the watcher loop at `interval`. A transient listing error skips
    /// the current tick rather than aborting the loop — it never crashes.
    pub async fn watch(self: Arc<Self>, interval: Duration) {
        tracing::info!(?interval, "watching for origin changes");
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            tracing::debug!("watch tick running");
            if let Err(e) = self.watch_tick().await {
                tracing::warn!(error = %e, "watch tick failed, will retry next interval");
            }
            tracing::debug!("watch tick done");
        }
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// §4.3.5 bootstrap check: refuse to start with zero tiers registered,
    /// mirroring `main.go`'s `panic("Please register at least one layer
    /// first.")` in `Run()`.
    pub fn ensure_ready(&self) {
        assert!(
            self.tier_count() > 0,
            "please register at least one layer first"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::cache::storage::memory::MemoryStore;
    use crate::cache::storage::origin::OriginStore;
    use crate::cache::storage::test_object;

    fn three_tier_manager() -> (Arc<Manager>, Arc<OriginStore>, Arc<MemoryStore>, Arc<MemoryStore>) {
        let origin = Arc::new(OriginStore::new());
        let fs = Arc::new(MemoryStore::new(1_000_000)); // stands in for the fs tier in unit tests
        let mem = Arc::new(MemoryStore::new(1_000_000));
        let mut manager = Manager::new("");
        manager.add_layer("origin", origin.clone(), false);
        manager.add_layer("fs", fs.clone(), true);
        manager.add_layer("mem", mem.clone(), true);
        (Arc::new(manager), origin, fs, mem)
    }

    #[tokio::test]
    async fn read_through_promotes_into_every_managed_tier() {
        let (manager, origin, fs, mem) = three_tier_manager();
        origin.seed(test_object("k", "v"));

        let got = manager.get("k").await.unwrap();
        assert_eq!(got.contents.as_ref(), b"v");

        // promotion is fire-and-forget; give spawned tasks a chance to run.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fs.get("k").await.is_ok());
        assert!(mem.get("k").await.is_ok());
    }

    #[tokio::test]
    async fn miss_everywhere_returns_not_found() {
        let (manager, _origin, _fs, _mem) = three_tier_manager();
        assert_matches!(manager.get("missing").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn fallback_key_redirects_on_origin_miss() {
        let origin = Arc::new(OriginStore::new());
        origin.seed(test_object("404.html", "not found page"));
        let mut manager = Manager::new("404.html");
        manager.add_layer("origin", origin.clone(), false);
        let manager = Arc::new(manager);

        let got = manager.get("missing").await.unwrap();
        assert_eq!(got.contents.as_ref(), b"not found page");

        let got = manager.get("404.html").await.unwrap();
        assert_eq!(got.contents.as_ref(), b"not found page");
    }

    #[tokio::test]
    async fn fallback_equal_to_key_does_not_recurse_forever() {
        let origin = Arc::new(OriginStore::new());
        let mut manager = Manager::new("missing");
        manager.add_layer("origin", origin, false);
        let manager = Arc::new(manager);

        assert_matches!(manager.get("missing").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn watched_only_delete_skips_origin() {
        let (manager, origin, fs, _mem) = three_tier_manager();
        origin.seed(test_object("k", "v"));
        fs.set(test_object("k", "v")).await.unwrap();

        manager.delete("k", true).await.unwrap();
        assert!(fs.get("k").await.is_err());
        // origin is untouched: our mock origin's delete is a no-op anyway,
        // but watched_only must not even reach it in the first place.
        assert!(origin.get("k").await.is_ok());
    }

    #[tokio::test]
    async fn watcher_deletes_key_removed_at_origin() {
        let (manager, origin, fs, _mem) = three_tier_manager();
        origin.seed(test_object("g/a", "v"));
        fs.set(test_object("g/a", "v")).await.unwrap();

        origin.remove("g/a");
        manager.watch_tick().await.unwrap();

        assert_matches!(fs.get("g/a").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn watcher_refreshes_key_updated_at_origin() {
        let (manager, origin, fs, _mem) = three_tier_manager();
        let t1 = chrono::Utc::now() - chrono::Duration::days(1);
        let t2 = chrono::Utc::now();
        origin.seed(test_object("g/a", "v1").with_mtime(t1));
        fs.set(test_object("g/a", "v1").with_mtime(t1)).await.unwrap();

        origin.seed(test_object("g/a", "v2").with_mtime(t2));
        manager.watch_tick().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let refreshed = fs.get("g/a").await.unwrap();
        assert_eq!(refreshed.contents.as_ref(), b"v2");
    }

    #[tokio::test]
    async fn prefetch_warms_every_matching_key() {
        let (manager, origin, fs, mem) = three_tier_manager();
        origin.seed(test_object("pre/1", "a"));
        origin.seed(test_object("pre/2", "b"));

        manager.prefetch_prefix("pre/").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(fs.get("pre/1").await.is_ok());
        assert!(fs.get("pre/2").await.is_ok());
        assert!(mem.get("pre/1").await.is_ok());
    }

    #[test]
    #[should_panic(expected = "please register at least one layer first")]
    fn ensure_ready_panics_with_zero_tiers() {
        let manager = Manager::new("");
        manager.ensure_ready();
    }

    #[test]
    fn ensure_ready_passes_with_a_registered_layer() {
        let origin = Arc::new(OriginStore::new());
        let mut manager = Manager::new("");
        manager.add_layer("origin", origin, false);
        manager.ensure_ready();
    }
}
