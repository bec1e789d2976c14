//! Durable JSON document store
//!
//! The whole record set lives in one file, a pretty-printed JSON array.
//! Every mutation rewrites the file in full using the atomic write pattern:
//! 1. Write to `<file>.tmp`
//! 2. fsync the temp file
//! 3. Rename temp to final (atomic on POSIX)
//! 4. fsync the parent directory
//!
//! A reader therefore sees either the old document or the new one, never a
//! truncated mix.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::observability::{Logger, MetricsRegistry};

use super::errors::{StoreError, StoreResult};
use super::lock;
use super::record::{RecordSet, UserRecord};

/// Attempts made for a write that keeps failing with a transient error
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// What a raw read of the backing file produced
enum Loaded {
    /// No file yet, or a file with nothing but whitespace in it
    Empty,
    Records(RecordSet),
    /// Unparsable content. The bytes are kept so they can be quarantined
    /// before the next save destroys them.
    Corrupt(Vec<u8>),
}

/// File-backed store for the user record set
pub struct DurableStore {
    path: PathBuf,
    temp_path: PathBuf,
    quarantine_path: PathBuf,
    lock: Arc<Mutex<()>>,
    metrics: Arc<MetricsRegistry>,
}

impl DurableStore {
    /// Open a store on `path` with its own metrics registry.
    ///
    /// Creates the parent directory if it is missing; the document itself
    /// is not touched until the first load or save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_metrics(path, Arc::new(MetricsRegistry::new()))
    }

    /// Open a store that reports into a shared metrics registry
    pub fn with_metrics(path: impl Into<PathBuf>, metrics: Arc<MetricsRegistry>) -> Self {
        let path = path.into();
        Self {
            temp_path: sibling(&path, ".tmp"),
            quarantine_path: sibling(&path, ".corrupt"),
            lock: lock::lock_for(&path),
            path,
            metrics,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the bytes of a malformed document are copied before a save
    /// overwrites them. An existing copy is never replaced; later copies go
    /// to `<file>.corrupt.1`, `<file>.corrupt.2` and so on.
    pub fn quarantine_path(&self) -> &Path {
        &self.quarantine_path
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Load the full record set.
    ///
    /// - Missing file: empty set.
    /// - Unparsable file: empty set, plus a WARN event and the
    ///   `corrupt_loads` counter. This silently discards every stored record
    ///   from the caller's point of view; the diagnostic is the only trace.
    /// - Any other read failure: `StoreError::ReadFailed`.
    pub fn load(&self) -> StoreResult<RecordSet> {
        let _guard = lock::acquire(&self.lock);
        Ok(match self.read_document()? {
            Loaded::Records(records) => records,
            Loaded::Empty | Loaded::Corrupt(_) => RecordSet::new(),
        })
    }

    /// Replace the backing document with `records`
    pub fn save(&self, records: &RecordSet) -> StoreResult<()> {
        let _guard = lock::acquire(&self.lock);
        self.write_document(records)
    }

    /// Run one read-modify-write cycle under the file lock.
    ///
    /// The closure sees the current record set; whatever it leaves behind is
    /// written back in full. The lock is held from the read until the rename
    /// completes and is released on every path, including errors.
    pub fn update<T, F>(&self, mutate: F) -> StoreResult<T>
    where
        F: FnOnce(&mut RecordSet) -> T,
    {
        let _guard = lock::acquire(&self.lock);

        let mut records = match self.read_document()? {
            Loaded::Records(records) => records,
            Loaded::Empty => RecordSet::new(),
            Loaded::Corrupt(bytes) => {
                self.quarantine(&bytes)?;
                RecordSet::new()
            }
        };

        let out = mutate(&mut records);
        self.write_document(&records)?;
        Ok(out)
    }

    /// Append one record; returns the new record count
    pub fn append(&self, record: UserRecord) -> StoreResult<usize> {
        let count = self.update(|records| {
            records.push(record);
            records.len()
        })?;
        self.metrics.increment_records_appended();
        Ok(count)
    }

    fn read_document(&self) -> StoreResult<Loaded> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Loaded::Empty),
            Err(e) => return Err(StoreError::read_failed(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Loaded::Empty);
        }

        let path = self.path.display().to_string();
        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                self.metrics.increment_corrupt_loads();
                Logger::warn(
                    "STORE_DOCUMENT_CORRUPT",
                    &[
                        ("path", path.as_str()),
                        ("reason", e.to_string().as_str()),
                        ("action", "treated_as_empty"),
                    ],
                );
                return Ok(Loaded::Corrupt(bytes));
            }
        };

        // The object-keyed-by-name layout is a different on-disk format, not data
        if value.is_object() {
            self.metrics.increment_corrupt_loads();
            Logger::warn(
                "STORE_LEGACY_FORMAT_REJECTED",
                &[("path", path.as_str()), ("action", "treated_as_empty")],
            );
            return Ok(Loaded::Corrupt(bytes));
        }

        match serde_json::from_value::<RecordSet>(value) {
            Ok(records) => Ok(Loaded::Records(records)),
            Err(e) => {
                self.metrics.increment_corrupt_loads();
                Logger::warn(
                    "STORE_DOCUMENT_CORRUPT",
                    &[
                        ("path", path.as_str()),
                        ("reason", e.to_string().as_str()),
                        ("action", "treated_as_empty"),
                    ],
                );
                Ok(Loaded::Corrupt(bytes))
            }
        }
    }

    fn quarantine(&self, bytes: &[u8]) -> StoreResult<()> {
        let mut n = 0u32;
        loop {
            let target = match n {
                0 => self.quarantine_path.clone(),
                n => sibling(&self.quarantine_path, &format!(".{}", n)),
            };

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    n += 1;
                    continue;
                }
                Err(e) => return Err(StoreError::write_failed(&target, e)),
            };
            file.write_all(bytes)
                .and_then(|()| file.sync_all())
                .map_err(|e| StoreError::write_failed(&target, e))?;

            Logger::warn(
                "STORE_CORRUPT_QUARANTINED",
                &[
                    ("path", self.path.display().to_string().as_str()),
                    ("quarantine_path", target.display().to_string().as_str()),
                ],
            );
            return Ok(());
        }
    }

    fn write_document(&self, records: &RecordSet) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(records)?;
        let bytes = content.as_bytes();
        self.write_with_retry(|| self.write_atomic(bytes))
    }

    /// Run `write` until it succeeds, fails permanently, or has failed
    /// transiently `MAX_WRITE_ATTEMPTS` times
    fn write_with_retry<F>(&self, mut write: F) -> StoreResult<()>
    where
        F: FnMut() -> io::Result<()>,
    {
        let mut attempt = 1;
        loop {
            match write() {
                Ok(()) => return Ok(()),
                Err(e) if is_transient(&e) && attempt < MAX_WRITE_ATTEMPTS => {
                    self.metrics.increment_write_retries();
                    Logger::warn(
                        "STORE_WRITE_RETRY",
                        &[
                            ("attempt", attempt.to_string().as_str()),
                            ("path", self.path.display().to_string().as_str()),
                            ("reason", e.to_string().as_str()),
                        ],
                    );
                    attempt += 1;
                }
                Err(e) => {
                    let _ = fs::remove_file(&self.temp_path);
                    Logger::error(
                        "STORE_SAVE_FAILED",
                        &[
                            ("path", self.path.display().to_string().as_str()),
                            ("reason", e.to_string().as_str()),
                        ],
                    );
                    return Err(StoreError::write_failed(&self.path, e));
                }
            }
        }
    }

    fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = non_empty_parent(&self.path) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;

        // Make the rename itself durable
        if let Some(parent) = non_empty_parent(&self.path) {
            sync_dir(parent)?;
        }

        Ok(())
    }
}

/// fsync a directory so a rename inside it survives a crash
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// `users.json` + `.tmp` -> `users.json.tmp`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Year;
    use tempfile::TempDir;

    fn alice() -> UserRecord {
        UserRecord::new("Alice", "u1", "C,Python", Some(Year::from("2020")))
    }

    fn bob() -> UserRecord {
        UserRecord::new("Bob", "u2", "Rust", Some(Year::from(2021)))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists(), "load must not create the file");
    }

    #[test]
    fn test_save_writes_pretty_array() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        store.save(&vec![alice()].into()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Alice\""));
        assert!(!store.temp_path.exists());
    }

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        assert_eq!(store.append(alice()).unwrap(), 1);
        assert_eq!(store.append(bob()).unwrap(), 2);
        assert_eq!(store.append(alice()).unwrap(), 3);

        let records = store.load().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Alice"]);
        assert_eq!(store.metrics().snapshot().records_appended, 3);
    }

    #[test]
    fn test_whitespace_file_is_empty_not_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));
        fs::write(store.path(), "  \n").unwrap();

        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.metrics().corrupt_loads(), 0);
    }

    #[test]
    fn test_corrupt_file_is_counted() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));
        fs::write(store.path(), b"\x00not json{{").unwrap();

        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.metrics().corrupt_loads(), 1);
    }

    #[test]
    fn test_wrong_shape_array_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));
        fs::write(store.path(), r#"[{"name": 7}]"#).unwrap();

        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.metrics().corrupt_loads(), 1);
    }

    #[test]
    fn test_update_quarantines_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));
        fs::write(store.path(), "garbage").unwrap();

        store.append(alice()).unwrap();

        assert_eq!(fs::read_to_string(store.quarantine_path()).unwrap(), "garbage");
        assert_eq!(store.load().unwrap().into_vec(), vec![alice()]);
    }

    #[test]
    fn test_second_quarantine_keeps_first_copy() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        fs::write(store.path(), "FIRST").unwrap();
        store.append(alice()).unwrap();
        fs::write(store.path(), "SECOND").unwrap();
        store.append(bob()).unwrap();

        let second = sibling(store.quarantine_path(), ".1");
        assert_eq!(fs::read_to_string(store.quarantine_path()).unwrap(), "FIRST");
        assert_eq!(fs::read_to_string(&second).unwrap(), "SECOND");
        assert_eq!(store.load().unwrap().into_vec(), vec![bob()]);
    }

    #[test]
    fn test_retry_recovers_from_transient_errors() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        let mut calls = 0;
        let result = store.write_with_retry(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::from(io::ErrorKind::Interrupted))
            } else {
                Ok(())
            }
        });

        assert!(result.is_ok());
        assert_eq!(calls, 3);
        assert_eq!(store.metrics().snapshot().write_retries, 2);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        let mut calls = 0;
        let err = store
            .write_with_retry(|| {
                calls += 1;
                Err(io::Error::from(io::ErrorKind::TimedOut))
            })
            .unwrap_err();

        assert_eq!(calls, MAX_WRITE_ATTEMPTS);
        assert_eq!(err.code().code(), "USERDB_STORE_WRITE_FAILED");
        assert_eq!(store.metrics().snapshot().write_retries, 2);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("users.json"));

        let mut calls = 0;
        let err = store
            .write_with_retry(|| {
                calls += 1;
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert_eq!(err.code().code(), "USERDB_STORE_WRITE_FAILED");
        assert_eq!(store.metrics().snapshot().write_retries, 0);
    }

    #[test]
    fn test_sync_dir_reports_failure() {
        let dir = TempDir::new().unwrap();
        assert!(sync_dir(dir.path()).is_ok());
        assert!(sync_dir(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn test_save_creates_missing_parent() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path().join("nested/deeper/users.json"));

        store.save(&vec![bob()].into()).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_sibling_paths() {
        assert_eq!(sibling(Path::new("a/users.json"), ".tmp"), PathBuf::from("a/users.json.tmp"));
    }
}
