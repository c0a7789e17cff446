// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{StoreError, StoreErrorCode};

/// Physical storage for uploaded artifacts, addressed by relative keys
/// such as `tasks/4/9_1700000000_report.pdf`.
pub trait BlobStore: Send + Sync {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn exists(&self, key: &str) -> Result<bool, StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn open_for_read(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

fn check_key(key: &str) -> Result<(), StoreError> {
    let path = Path::new(key);
    let clean = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if clean {
        Ok(())
    } else {
        Err(StoreError::new(
            StoreErrorCode::Internal,
            format!("invalid storage key: {key}"),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct LocalFsBlobStore {
    pub root: PathBuf,
}

impl LocalFsBlobStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl BlobStore for LocalFsBlobStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = path.clone().into_os_string();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);
        let written = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &path));
        if let Err(err) = written {
            // The temp file may not exist if creation itself failed.
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key)?.is_file())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        fs::remove_file(self.path_for(key)?)?;
        Ok(())
    }

    fn open_for_read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(self.path_for(key)?)?)
    }
}

/// In-process blob store for tests. Removals can be forced to fail.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_removals: AtomicBool,
}

impl MemoryBlobStore {
    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::Relaxed);
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn with_blobs<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "blob map poisoned"))?;
        f(&mut guard)
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        check_key(key)?;
        self.with_blobs(|m| {
            m.insert(key.to_string(), bytes.to_vec());
            Ok(())
        })
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.with_blobs(|m| Ok(m.contains_key(key)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_removals.load(Ordering::Relaxed) {
            return Err(StoreError::new(StoreErrorCode::Io, format!("remove refused: {key}")));
        }
        self.with_blobs(|m| {
            m.remove(key)
                .map(|_| ())
                .ok_or_else(|| StoreError::new(StoreErrorCode::NotFound, key.to_string()))
        })
    }

    fn open_for_read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.with_blobs(|m| {
            m.get(key)
                .cloned()
                .ok_or_else(|| StoreError::new(StoreErrorCode::NotFound, key.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_store_round_trip_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFsBlobStore::new(dir.path().to_path_buf());
        store.save("tasks/1/2_3_a.txt", b"hello").expect("save");
        assert!(store.exists("tasks/1/2_3_a.txt").expect("exists"));
        assert_eq!(store.open_for_read("tasks/1/2_3_a.txt").expect("read"), b"hello");
        store.remove("tasks/1/2_3_a.txt").expect("remove");
        assert!(!store.exists("tasks/1/2_3_a.txt").expect("exists"));
        let err = store.remove("tasks/1/2_3_a.txt").expect_err("already gone");
        assert_eq!(err.code, StoreErrorCode::NotFound);
    }

    #[test]
    fn failed_save_leaves_no_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFsBlobStore::new(dir.path().to_path_buf());
        fs::create_dir_all(dir.path().join("tasks/1/taken")).expect("occupy target");
        assert!(store.save("tasks/1/taken", b"hello").is_err());
        assert!(!dir.path().join("tasks/1/taken.part").exists());
    }

    #[test]
    fn keys_cannot_leave_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFsBlobStore::new(dir.path().to_path_buf());
        assert!(store.save("../escape.txt", b"x").is_err());
        assert!(store.save("/abs.txt", b"x").is_err());
        assert!(store.save("", b"x").is_err());
    }

    #[test]
    fn memory_store_can_refuse_removal() {
        let store = MemoryBlobStore::default();
        store.save("tasks/1/a", b"x").expect("save");
        store.set_fail_removals(true);
        assert!(store.remove("tasks/1/a").is_err());
        assert_eq!(store.keys(), vec!["tasks/1/a".to_string()]);
    }
}
