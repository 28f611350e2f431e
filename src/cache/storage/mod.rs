//! The Store contract (C1)
//!
//! Uniform `{get, set, list, delete}` over a keyspace of opaque objects.
//! `Error::NotFound` is the sentinel the Manager dispatches on; every other
//! error is opaque and short-circuits the caller.

pub mod filesystem;
pub mod memory;
pub mod origin;

use crate::cache::entry::Object;
use crate::error::Result;
use async_trait::async_trait;

/// A single tier in the cache stack.
///
/// `set` is an idempotent upsert by key. A read-only tier (the origin) may
/// implement it as a no-op — the Manager treats any `Set` failure on the
/// origin as advisory, never fatal.
///
/// `list` returns objects whose keys start with `prefix`; only `key` and
/// `mtime` are required to be populated, `contents` may be left empty.
/// Order is unspecified.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Object>;

    async fn set(&self, object: Object) -> Result<()>;

    async fn list(&self, prefix: &str) -> Result<Vec<Object>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) fn test_object(key: &str, contents: &str) -> Object {
    Object::new(key, contents.to_string())
}
