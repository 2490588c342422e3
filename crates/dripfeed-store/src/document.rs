use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// Read and parse the JSON document at `path`.
///
/// A missing file yields `default` and is *not* created. A file that exists
/// but does not parse yields [`StoreError::CorruptState`].
pub fn load_json<T: DeserializeOwned>(path: &Path, default: T) -> Result<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(default),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes).map_err(|source| StoreError::CorruptState {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// Writes `<file>.tmp`, fsyncs it, renames it over the target, then fsyncs
/// the parent directory so the rename itself survives a power loss.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp_path = sibling_path(path, ".tmp");
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(path, e));
    }

    sync_dir(parent.unwrap_or_else(|| Path::new(".")))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| StoreError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// `schedule.json` + `.tmp` -> `schedule.json.tmp`.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// What an [`JsonDocument::update`] closure did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<R> {
    /// The document was modified and must be saved.
    Dirty(R),
    /// Nothing changed; skip the write.
    Clean(R),
}

/// One JSON document on disk plus the lock that serializes its mutations.
///
/// Every [`update`](Self::update) holds the lock for the whole
/// load → modify → save sequence, so two in-process writers can never
/// interleave and lose each other's changes. The lock is never held across
/// anything but file I/O.
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents, or `T::default()` when the file does not exist yet.
    ///
    /// Lock-free: saves are rename-based, so a reader sees either the old or
    /// the new document, never a partial one.
    pub fn load(&self) -> Result<T> {
        load_json(&self.path, T::default())
    }

    /// Run one serialized load → modify → save cycle.
    ///
    /// If the save fails the error is returned and the file on disk is the
    /// pre-update version.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> Change<R>) -> Result<R> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut doc = self.load()?;
        match f(&mut doc) {
            Change::Dirty(out) => {
                save_json(&self.path, &doc)?;
                debug!(path = %self.path.display(), "document saved");
                Ok(out)
            }
            Change::Clean(out) => Ok(out),
        }
    }

    /// Move a corrupt document aside so the next load starts from the default.
    ///
    /// Returns the quarantine path, or `None` when there was no file.
    pub fn quarantine(&self) -> Result<Option<PathBuf>> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.path.exists() {
            return Ok(None);
        }
        let suffix = format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%SZ"));
        let target = sibling_path(&self.path, &suffix);
        fs::rename(&self.path, &target).map_err(|e| StoreError::io(&self.path, e))?;
        warn!(
            path = %self.path.display(),
            moved_to = %target.display(),
            "corrupt document quarantined"
        );
        Ok(Some(target))
    }
}
