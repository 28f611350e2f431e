//! The Object type
//!
//! The single value crossing all tiers: a key, an optional modification
//! time, and an opaque byte payload.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// An object stored in some tier of the cache.
///
/// `key` conventionally looks like `group/rest/of/path` — the segment before
/// the first `/` is the "group" the watcher and origin adapter use to bound
/// listing work. `mtime` of `None` is the sentinel "unknown/unset" time: it
/// suppresses timestamp propagation (e.g. the filesystem tier will not call
/// `set_file_mtime` for an object with no mtime).
#[derive(Debug, Clone)]
pub struct Object {
    pub key: String,
    pub mtime: Option<DateTime<Utc>>,
    pub contents: Bytes,
}

impl Object {
    pub fn new(key: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            mtime: None,
            contents: contents.into(),
        }
    }

    pub fn with_mtime(mut self, mtime: DateTime<Utc>) -> Self {
        self.mtime = Some(mtime);
        self
    }

    /// Byte length of `contents` — what the memory tier calls `item.size`.
    pub fn size(&self) -> usize {
        self.contents.len()
    }

    /// The segment before the first `/`, used by the watcher to group keys
    /// for bounded origin listing.
    pub fn group(&self) -> &str {
        self.key.split('/').next().unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_is_first_path_segment() {
        let obj = Object::new("bucket/path/to/key", "data");
        assert_eq!(obj.group(), "bucket");
    }

    #[test]
    fn group_of_key_without_slash_is_whole_key() {
        let obj = Object::new("key", "data");
        assert_eq!(obj.group(), "key");
    }

    #[test]
    fn size_is_byte_length_of_contents() {
        let obj = Object::new("k", "hello");
        assert_eq!(obj.size(), 5);
    }

    #[test]
    fn no_mtime_by_default() {
        let obj = Object::new("k", "v");
        assert!(obj.mtime.is_none());
    }
}
