//! Filesystem tier
//!
//! A managed Store backed by plain files under a root directory. Grounded on
//! `fscache.go`: each key maps to a path by direct concatenation under the
//! root, intermediate directories are created on write, and there is no
//! metadata sidecar and no framing — the file's contents are the object's
//! contents, and the file's own mtime is the object's mtime. This is a
//! deliberate divergence from this corpus's other disk-backed tier, which
//! hash-shards directories and writes a `.meta` JSON sidecar per entry;
//! SPEC_FULL.md §6.4 rules that layout out for this tier.

use crate::cache::entry::Object;
use crate::cache::storage::Store;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

/// Disk-backed managed tier. The lock only serializes our own bookkeeping;
/// the filesystem itself provides no cross-process coordination, matching
/// §5's note that concurrency discipline here mirrors the memory tier's.
pub struct FilesystemStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl Store for FilesystemStore {
    async fn get(&self, key: &str) -> Result<Object> {
        let _guard = self.lock.read();
        let path = self.path_for(key);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::NotFound),
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Err(Error::NotFound);
        }
        let contents = tokio::fs::read(&path).await?;
        let mtime = metadata
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);
        let mut object = Object::new(key, contents);
        if let Some(mtime) = mtime {
            object = object.with_mtime(mtime);
        }
        Ok(object)
    }

    async fn set(&self, object: Object) -> Result<()> {
        let _guard = self.lock.write();
        let path = self.path_for(&object.key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &object.contents).await?;

        // The zero-time sentinel suppresses mtime propagation, mirroring
        // `fscache.go`'s `if file.Mtime != Epoc { os.Chtimes(...) }`.
        if let Some(mtime) = object.mtime {
            let ft = filetime::FileTime::from_unix_time(mtime.timestamp(), 0);
            filetime::set_file_times(&path, ft, ft)?;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Object>> {
        let _guard = self.lock.read();
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || walk(&root, &prefix))
            .await
            .map_err(|e| Error::Internal(format!("list task panicked: {e}")))?
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write();
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

fn walk(root: &Path, prefix: &str) -> Result<Vec<Object>> {
    let mut objects = Vec::new();
    visit(root, root, prefix, &mut objects)?;
    Ok(objects)
}

fn visit(root: &Path, dir: &Path, prefix: &str, out: &mut Vec<Object>) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            visit(root, &path, prefix, out)?;
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .map_err(|e| Error::Internal(format!("path outside root: {e}")))?;
        let key = relative.to_string_lossy().replace('\\', "/");
        // A key this short can only come from a corrupted tree walk; a
        // healthy listing never produces one. Crash rather than hand back
        // a corrupt key, in release builds too.
        assert!(key.len() >= 3, "degenerate listing key: {key:?}");
        if key.starts_with(prefix) {
            let mtime = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);
            let mut object = Object::new(key, Vec::new());
            if let Some(mtime) = mtime {
                object = object.with_mtime(mtime);
            }
            out.push(object);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::cache::storage::test_object;
    use tempfile::TempDir;

    fn store() -> (TempDir, FilesystemStore) {
        let dir = TempDir::new().unwrap();
        let fs = FilesystemStore::new(dir.path());
        (dir, fs)
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let (_dir, fs) = store();
        fs.set(test_object("test/b", "Test")).await.unwrap();
        let got = fs.get("test/b").await.unwrap();
        assert_eq!(got.contents.as_ref(), b"Test");
    }

    #[tokio::test]
    async fn get_on_missing_key_is_not_found() {
        let (_dir, fs) = store();
        assert_matches!(fs.get("test/dne").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn set_overwrites_existing_key() {
        let (_dir, fs) = store();
        fs.set(test_object("test/b", "Test")).await.unwrap();
        fs.set(test_object("test/b", "Blah")).await.unwrap();
        let got = fs.get("test/b").await.unwrap();
        assert_eq!(got.contents.as_ref(), b"Blah");
    }

    #[tokio::test]
    async fn delete_missing_key_is_not_found() {
        let (_dir, fs) = store();
        assert_matches!(fs.delete("nope").await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn list_returns_matching_prefix_only() {
        let (_dir, fs) = store();
        fs.set(test_object("a/1", "x")).await.unwrap();
        fs.set(test_object("a/2", "y")).await.unwrap();
        fs.set(test_object("b/1", "z")).await.unwrap();
        let matched = fs.list("a/").await.unwrap();
        assert_eq!(matched.len(), 2);
    }

    #[tokio::test]
    async fn list_with_empty_prefix_returns_everything() {
        let (_dir, fs) = store();
        fs.set(test_object("a/1", "x")).await.unwrap();
        fs.set(test_object("b/1", "y")).await.unwrap();
        let all = fs.list("").await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn mtime_is_preserved_when_set() {
        let (_dir, fs) = store();
        let mtime = Utc::now() - chrono::Duration::days(1);
        fs.set(test_object("a", "x").with_mtime(mtime)).await.unwrap();
        let got = fs.get("a").await.unwrap();
        let got_mtime = got.mtime.expect("mtime should be set");
        assert_eq!(got_mtime.timestamp(), mtime.timestamp());
    }
}
