//! Mock origin tier
//!
//! The real origin adapter (a remote blob store) is an external
//! collaborator out of scope for this crate — only the Store contract it
//! must satisfy is specified. This in-memory mock implements that contract
//! for tests and local examples, grounded on the shape of
//! `cache/storage/persistent.rs` (teacher) but stripped of its
//! availability-toggle feature, which has no counterpart here.
//!
//! `set` and `delete` are no-ops: SPEC_FULL.md §9 resolves the origin as
//! read-only by design, matching `s3.go`'s `Set`/`Delete` returning `nil`
//! unconditionally.

use crate::cache::entry::Object;
use crate::cache::storage::Store;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct OriginStore {
    objects: RwLock<HashMap<String, Object>>,
}

impl OriginStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the origin directly — this is the only way to put data into a
    /// read-only tier; production origins would be populated out of band.
    pub fn seed(&self, object: Object) {
        self.objects.write().insert(object.key.clone(), object);
    }

    pub fn remove(&self, key: &str) {
        self.objects.write().remove(key);
    }
}

#[async_trait]
impl Store for OriginStore {
    async fn get(&self, key: &str) -> Result<Object> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn set(&self, _object: Object) -> Result<()> {
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Object>> {
        Ok(self
            .objects
            .read()
            .values()
            .filter(|o| o.key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::cache::storage::test_object;

    #[tokio::test]
    async fn seeded_object_is_gettable() {
        let origin = OriginStore::new();
        origin.seed(test_object("k", "v"));
        let got = origin.get("k").await.unwrap();
        assert_eq!(got.contents.as_ref(), b"v");
    }

    #[tokio::test]
    async fn unseeded_key_is_not_found() {
        let origin = OriginStore::new();
        assert_matches!(origin.get("missing").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn set_and_delete_are_advisory_no_ops() {
        let origin = OriginStore::new();
        origin.seed(test_object("k", "v"));
        origin.set(test_object("k", "other")).await.unwrap();
        // set() is a no-op: the seeded value is unchanged.
        assert_eq!(origin.get("k").await.unwrap().contents.as_ref(), b"v");
        origin.delete("k").await.unwrap();
        // delete() is a no-op too: the key is still there.
        assert!(origin.get("k").await.is_ok());
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let origin = OriginStore::new();
        origin.seed(test_object("bucket/a", "1"));
        origin.seed(test_object("bucket/b", "2"));
        origin.seed(test_object("other/c", "3"));
        let matched = origin.list("bucket/").await.unwrap();
        assert_eq!(matched.len(), 2);
    }
}
