//! Memory Tier (C2)
//!
//! A bounded-byte Store with approximate least-frequently-used eviction: a
//! dense array of items plus a key→index map, both guarded by one
//! readers-writer lock. Grounded directly on the array/index-map/RWMutex
//! design in `memcache.go` — the eviction pass sorts the array by access
//! count and deletes from the coldest end until the tier is back under
//! budget.

use crate::cache::entry::Object;
use crate::cache::storage::Store;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

struct CacheItem {
    object: Object,
    size: usize,
    access_count: AtomicU64,
}

struct Inner {
    data: Vec<CacheItem>,
    index: HashMap<String, usize>,
    total_size: usize,
}

impl Inner {
    /// Swap-with-last removal, keeping `index` dense and O(1).
    fn remove_at(&mut self, idx: usize) -> CacheItem {
        let last = self.data.len() - 1;
        if idx != last {
            self.data.swap(idx, last);
            let moved_key = self.data[idx].object.key.clone();
            self.index.insert(moved_key, idx);
        }
        let item = self.data.pop().expect("index pointed into a non-empty array");
        self.total_size -= item.size;
        item
    }

    /// §4.2 eviction pass: sort coldest-first, delete until `excess` bytes
    /// have been reclaimed. Runs under a single write-lock acquisition — no
    /// recursive lock/unlock around an internal delete, which is what makes
    /// the Go source's `free()` deadlock-prone (see SPEC_FULL.md §9).
    fn free(&mut self, max_size: usize) {
        if self.total_size <= max_size {
            return;
        }
        let mut excess = self.total_size - max_size;

        // Capture keys sorted coldest-first up front: swap-removal reshuffles
        // positions as we go, so indices computed before the loop starts
        // would point at the wrong items by the second deletion.
        let mut order: Vec<String> = self.data.iter().map(|item| item.object.key.clone()).collect();
        order.sort_by_key(|key| {
            let idx = self.index[key];
            self.data[idx].access_count.load(Ordering::Relaxed)
        });

        for key in order {
            if excess == 0 {
                break;
            }
            if let Some(&idx) = self.index.get(&key) {
                let removed = self.remove_at(idx);
                self.index.remove(&key);
                excess = excess.saturating_sub(removed.size);
            }
        }
    }
}

/// The memory tier: bounded, frequency-evicted, single-lock.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    max_size: usize,
}

impl MemoryStore {
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                data: Vec::new(),
                index: HashMap::new(),
                total_size: 0,
            }),
            max_size: max_size_bytes,
        }
    }

    /// Current accounted size, for tests and metrics.
    pub fn total_size(&self) -> usize {
        self.inner.read().total_size
    }

    /// Number of live entries, for tests and metrics.
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Object> {
        let guard = self.inner.read();
        let idx = *guard.index.get(key).ok_or(Error::NotFound)?;
        let item = &guard.data[idx];
        item.access_count.fetch_add(1, Ordering::Relaxed);
        Ok(item.object.clone())
    }

    async fn set(&self, object: Object) -> Result<()> {
        let size = object.size();

        // Admission rule: an object larger than the whole budget is silently
        // dropped rather than forcing eviction of everything for something
        // that could never be usable on its own.
        if size > self.max_size {
            tracing::warn!(key = %object.key, size, max_size = self.max_size, "object larger than memory tier, refusing admission");
            return Ok(());
        }

        let mut guard = self.inner.write();
        match guard.index.get(&object.key).copied() {
            Some(idx) => {
                let old_size = guard.data[idx].size;
                guard.total_size = guard.total_size - old_size + size;
                guard.data[idx].object = object;
                guard.data[idx].size = size;
                // accessCount is preserved across a refreshing Set.
            }
            None => {
                let key = object.key.clone();
                guard.data.push(CacheItem {
                    object,
                    size,
                    access_count: AtomicU64::new(0),
                });
                guard.index.insert(key, guard.data.len() - 1);
                guard.total_size += size;
            }
        }
        guard.free(self.max_size);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Object>> {
        let guard = self.inner.read();
        Ok(guard
            .data
            .iter()
            .filter(|item| item.object.key.starts_with(prefix))
            .map(|item| item.object.clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.inner.write();
        let idx = *guard.index.get(key).ok_or(Error::NotFound)?;
        guard.remove_at(idx);
        guard.index.remove(key);
        Ok(())
    }
}
