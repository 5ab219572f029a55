//! Local key-value persistence for the selected exam and the counselling draft.
//!
//! The store is deliberately narrow: two keys, string values, whole-value
//! overwrite. Callers never touch keys directly; they go through
//! [`DraftStore`], which owns the JSON encoding.
//!
//! There is only ever one writer (the running flow), so no locking is done.
//! [`FileStore`] still writes through a temp file + rename so that a crash
//! mid-write cannot leave a truncated draft behind.

use crate::counselling::FormRecord;
use crate::error::EduGuideError;
use crate::exam::Exam;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// The only keys ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    SelectedExam,
    CounsellingDraft,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::SelectedExam => "eduguide_selected_exam",
            StorageKey::CounsellingDraft => "eduguide_choice_filling_draft",
        }
    }
}

/// Read / write / clear over string values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: StorageKey) -> Result<Option<String>, EduGuideError>;
    fn set(&self, key: StorageKey, value: &str) -> Result<(), EduGuideError>;
    fn remove(&self, key: StorageKey) -> Result<(), EduGuideError>;
}

fn storage_err(key: StorageKey, e: impl std::fmt::Display) -> EduGuideError {
    EduGuideError::Storage {
        key: key.as_str().to_string(),
        detail: e.to_string(),
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory (`$XDG_DATA_HOME/eduguide`,
    /// `~/Library/Application Support/eduguide`, `%APPDATA%\eduguide`).
    pub fn in_data_dir() -> Result<Self, EduGuideError> {
        let base = dirs::data_dir().ok_or_else(|| {
            EduGuideError::InvalidConfig("no platform data directory; pass --storage-dir".into())
        })?;
        Ok(Self::new(base.join("eduguide")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, EduGuideError> {
        match std::fs::read_to_string(self.path_of(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(key, e)),
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), EduGuideError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_err(key, e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| storage_err(key, e))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| storage_err(key, e))?;
        tmp.persist(self.path_of(key))
            .map_err(|e| storage_err(key, e.error))?;
        debug!("Stored '{}' ({} bytes)", key.as_str(), value.len());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), EduGuideError> {
        match std::fs::remove_file(self.path_of(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(key, e)),
        }
    }
}

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<StorageKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StorageKey, String>>, EduGuideError> {
        self.values
            .lock()
            .map_err(|_| EduGuideError::Internal("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, EduGuideError> {
        Ok(self.lock()?.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), EduGuideError> {
        self.lock()?.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), EduGuideError> {
        self.lock()?.remove(&key);
        Ok(())
    }
}

/// Typed access to the two persisted values.
#[derive(Clone)]
pub struct DraftStore {
    inner: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").finish_non_exhaustive()
    }
}

impl DraftStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The persisted counselling draft, if one exists and parses.
    ///
    /// A draft that fails to parse is logged and treated as absent; the
    /// corrupt value is left in place until the next save overwrites it.
    pub fn load_draft(&self) -> Result<Option<FormRecord>, EduGuideError> {
        let Some(raw) = self.inner.get(StorageKey::CounsellingDraft)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Failed to load draft: {e}");
                Ok(None)
            }
        }
    }

    pub fn save_draft(&self, record: &FormRecord) -> Result<(), EduGuideError> {
        let json = serde_json::to_string(record)
            .map_err(|e| storage_err(StorageKey::CounsellingDraft, e))?;
        self.inner.set(StorageKey::CounsellingDraft, &json)
    }

    pub fn clear_draft(&self) -> Result<(), EduGuideError> {
        self.inner.remove(StorageKey::CounsellingDraft)
    }

    /// The selected exam; missing or unknown values fall back to the default.
    ///
    /// Values written by other front-ends may be `"JEE"` or `"jee"`, with or
    /// without JSON quotes, so both forms are accepted.
    pub fn load_exam(&self) -> Result<Exam, EduGuideError> {
        let Some(raw) = self.inner.get(StorageKey::SelectedExam)? else {
            return Ok(Exam::default());
        };
        let unquoted = serde_json::from_str::<String>(&raw).unwrap_or(raw);
        Ok(unquoted.parse().unwrap_or_else(|e| {
            warn!("Ignoring stored exam: {e}");
            Exam::default()
        }))
    }

    pub fn save_exam(&self, exam: Exam) -> Result<(), EduGuideError> {
        let json = serde_json::to_string(&exam)
            .map_err(|e| storage_err(StorageKey::SelectedExam, e))?;
        self.inner.set(StorageKey::SelectedExam, &json)
    }
}
