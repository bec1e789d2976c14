//! Per-file writer locks
//!
//! Every `DurableStore` opened on the same backing file shares one mutex, so
//! two handles in one process cannot interleave their read-modify-write
//! cycles. Paths are resolved before lookup; two spellings of one file get
//! one lock. Locking across processes is out of scope.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

static FILE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the lock shared by every store on `path`
pub(crate) fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(path);
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    Arc::clone(locks.entry(key).or_default())
}

/// Acquire a file lock.
///
/// A panic while holding the lock leaves nothing half-done in memory (the
/// file is only ever replaced by rename), so a poisoned lock is still usable.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

/// Resolve `path` to the file it actually names, so aliases such as
/// `dir/sub/../users.json` or a symlinked data directory map to one key.
///
/// The parent directory is created if missing; it has to exist to be
/// resolved, and the first save would create it anyway.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    // The file itself may be a symlink
    if let Ok(resolved) = fs::canonicalize(&absolute) {
        return resolved;
    }

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => {
            let _ = fs::create_dir_all(parent);
            match fs::canonicalize(parent) {
                Ok(dir) => dir.join(name),
                Err(_) => absolute,
            }
        }
        _ => absolute,
    }
}
