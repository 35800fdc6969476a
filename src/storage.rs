//! Filesystem primitives the cache engine is built on.
//!
//! The engine never touches `std::fs` directly for path bookkeeping: it asks a
//! [`Storage`] whether things exist, when they changed, and to create or
//! remove directories and files. [`FsStorage`] is the real filesystem.
//!
//! Deletes report whether anything was removed; a missing target is `Ok(false)`,
//! not an error.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

pub trait Storage {
    /// Whether a regular file exists at `path`. Directories do not count.
    fn exists(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents. Idempotent.
    fn ensure_dir(&self, path: &Path) -> io::Result<()>;

    fn delete(&self, path: &Path) -> io::Result<bool>;

    /// Remove a directory and everything under it.
    fn delete_recursive(&self, dir: &Path) -> io::Result<bool>;

    fn last_modified(&self, path: &Path) -> io::Result<SystemTime>;
}

/// [`Storage`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

fn missing_is_false(result: io::Result<()>) -> io::Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

impl Storage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn delete(&self, path: &Path) -> io::Result<bool> {
        missing_is_false(fs::remove_file(path))
    }

    fn delete_recursive(&self, dir: &Path) -> io::Result<bool> {
        missing_is_false(fs::remove_dir_all(dir))
    }

    fn last_modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }
}
