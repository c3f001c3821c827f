use crate::domain::KVStoreError;
use crate::ports::KeyValueStore;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed key-value store for terminals.
///
/// Persists a JSON object of string keys to string values. Every write
/// replaces the file atomically (temp file, fsync, rename), so a crash never
/// leaves a half-written record behind. An exclusive `fs2` lock on
/// `<path>.lock` keeps a second terminal process off the same file.
pub struct FileBackedKVStore {
    data: BTreeMap<String, String>,
    path: PathBuf,
    // Held open for the lifetime of the store; released on drop.
    _lock: File,
}

fn io_err(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

impl FileBackedKVStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    ///
    /// `KVStoreError::Locked` if another process holds the store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let lock_path = path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_err)?;
        if lock.try_lock_exclusive().is_err() {
            return Err(KVStoreError::Locked {
                path: lock_path.display().to_string(),
            });
        }

        let data = Self::load_from_file(&path);
        tracing::info!(
            path = %path.display(),
            keys = data.len(),
            "[bt] 💾 Opened pending-vote store"
        );

        Ok(Self {
            data,
            path,
            _lock: lock,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> BTreeMap<String, String> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "[bt] Store unreadable, starting empty");
                return BTreeMap::new();
            }
        };
        if bytes.is_empty() {
            return BTreeMap::new();
        }
        match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "[bt] Store file malformed, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        let bytes = serde_json::to_vec_pretty(&self.data).map_err(|e| KVStoreError::Serialization {
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &str) -> Result<Option<String>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), KVStoreError> {
        let previous = self.data.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save_to_file() {
            // Keep memory in line with disk.
            match previous {
                Some(v) => self.data.insert(key.to_string(), v),
                None => self.data.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        let Some(previous) = self.data.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.save_to_file() {
            self.data.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
