//! Test-only failure injection for the batch operations.
//!
//! Active under `cfg(test)` or the `test-helpers` feature. Failures are
//! keyed by path so tests running in parallel on their own temp
//! directories do not see each other's hooks. Without the feature the
//! functions compile to no-ops and nothing is ever forced to fail.
//!
//! Three sites can be forced:
//! - opening a file for reading before a rewrite (with a chosen error kind),
//! - writing rewritten content back,
//! - renaming an entry.

#[cfg(any(test, feature = "test-helpers"))]
use std::io;
#[cfg(any(test, feature = "test-helpers"))]
use std::path::{Path, PathBuf};
#[cfg(any(test, feature = "test-helpers"))]
use std::sync::{Mutex, MutexGuard, OnceLock};

#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Open(io::ErrorKind),
    WriteBack,
    Rename,
}

#[cfg(any(test, feature = "test-helpers"))]
fn forced() -> MutexGuard<'static, Vec<(Site, PathBuf)>> {
    static FORCED: OnceLock<Mutex<Vec<(Site, PathBuf)>>> = OnceLock::new();
    FORCED
        .get_or_init(|| Mutex::new(Vec::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(any(test, feature = "test-helpers"))]
fn is_forced(path: &Path, matches: impl Fn(Site) -> bool) -> bool {
    forced().iter().any(|(site, p)| matches(*site) && p == path)
}

/// Make every write-back to `path` fail until cleared.
#[cfg(any(test, feature = "test-helpers"))]
pub fn fail_write_back_for(path: impl Into<PathBuf>) {
    forced().push((Site::WriteBack, path.into()));
}

#[cfg(any(test, feature = "test-helpers"))]
pub fn clear_write_back_failure(path: &Path) {
    forced().retain(|(site, p)| !(*site == Site::WriteBack && p == path));
}

#[cfg(any(test, feature = "test-helpers"))]
pub fn should_fail_write_back(path: &Path) -> bool {
    is_forced(path, |site| site == Site::WriteBack)
}

/// Make opening `path` for a rewrite fail with `kind` until cleared.
/// `NotFound` looks like a file deleted between listing and reading.
#[cfg(any(test, feature = "test-helpers"))]
pub fn fail_open_for(path: impl Into<PathBuf>, kind: io::ErrorKind) {
    forced().push((Site::Open(kind), path.into()));
}

#[cfg(any(test, feature = "test-helpers"))]
pub fn clear_open_failure(path: &Path) {
    forced().retain(|(site, p)| !(matches!(site, Site::Open(_)) && p == path));
}

#[cfg(any(test, feature = "test-helpers"))]
pub fn forced_open_error(path: &Path) -> Option<io::Error> {
    forced().iter().find_map(|(site, p)| match site {
        Site::Open(kind) if p == path => Some(io::Error::new(*kind, "forced open failure")),
        _ => None,
    })
}

/// Make renaming `path` fail until cleared.
#[cfg(any(test, feature = "test-helpers"))]
pub fn fail_rename_for(path: impl Into<PathBuf>) {
    forced().push((Site::Rename, path.into()));
}

#[cfg(any(test, feature = "test-helpers"))]
pub fn clear_rename_failure(path: &Path) {
    forced().retain(|(site, p)| !(*site == Site::Rename && p == path));
}

#[cfg(any(test, feature = "test-helpers"))]
pub fn should_fail_rename(path: &Path) -> bool {
    is_forced(path, |site| site == Site::Rename)
}

// No-op fallbacks when the feature is not active.
#[cfg(not(any(test, feature = "test-helpers")))]
pub fn fail_write_back_for(_path: impl Into<std::path::PathBuf>) {}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn clear_write_back_failure(_path: &std::path::Path) {}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn should_fail_write_back(_path: &std::path::Path) -> bool {
    false
}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn fail_open_for(_path: impl Into<std::path::PathBuf>, _kind: std::io::ErrorKind) {}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn clear_open_failure(_path: &std::path::Path) {}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn forced_open_error(_path: &std::path::Path) -> Option<std::io::Error> {
    None
}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn fail_rename_for(_path: impl Into<std::path::PathBuf>) {}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn clear_rename_failure(_path: &std::path::Path) {}

#[cfg(not(any(test, feature = "test-helpers")))]
pub fn should_fail_rename(_path: &std::path::Path) -> bool {
    false
}
