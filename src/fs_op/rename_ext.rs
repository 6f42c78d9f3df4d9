//! Batch extension renaming.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::fs_op::error::FsOpError;
use crate::fs_op::report::{BatchReport, FailureKind};
use crate::fs_op::test_hooks;
use crate::fs_op::walk::{walk_with, TraversalMode, WalkOptions};

/// A file extension including its leading dot, e.g. `.txt`.
///
/// Matching is exact and case-sensitive: `.txt` matches `notes.txt` but not
/// `notes.TXT`, `notes.txtx` or `archive.txt.gz`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extension(String);

impl Extension {
    pub fn new(s: &str) -> Result<Self, FsOpError> {
        let name = s
            .strip_prefix('.')
            .filter(|n| !n.is_empty() && !n.contains(['.', '/', '\\']))
            .ok_or_else(|| FsOpError::InvalidExtension(s.to_string()))?;
        Ok(Extension(format!(".{name}")))
    }

    /// The extension with its dot.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The extension without its dot, as `Path::extension` reports it.
    fn name(&self) -> &str {
        &self.0[1..]
    }

    /// Whether the final extension of `path` is exactly this one.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.as_encoded_bytes() == self.name().as_bytes())
            .unwrap_or(false)
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate the replacement extension and return it without its dot.
/// An empty string strips the extension.
fn replacement(to: &str) -> Result<&str, FsOpError> {
    if to.is_empty() {
        return Ok("");
    }
    to.strip_prefix('.')
        .filter(|n| !n.is_empty() && !n.starts_with('.') && !n.ends_with('.') && !n.contains(['/', '\\']))
        .ok_or_else(|| FsOpError::InvalidExtension(to.to_string()))
}

/// Rename every regular file under `root` whose extension is `from` so it
/// ends in `to` instead, keeping the rest of the path.
///
/// Directories and non-matching files are left alone. A failed rename is
/// recorded in the report and the remaining files are still processed;
/// renames already done are not rolled back. An existing file at the target
/// path is never overwritten.
///
/// ```no_run
/// use file_batch::fs_op::{rename_extensions, TraversalMode};
/// let report = rename_extensions("/tmp/t", ".txt", ".data", TraversalMode::Shallow).unwrap();
/// println!("{report}");
/// ```
pub fn rename_extensions<P: AsRef<Path>>(
    root: P,
    from: &str,
    to: &str,
    mode: TraversalMode,
) -> Result<BatchReport, FsOpError> {
    rename_extensions_with(root, from, to, &WalkOptions::new(mode))
}

/// [`rename_extensions`] with explicit walk options.
pub fn rename_extensions_with<P: AsRef<Path>>(
    root: P,
    from: &str,
    to: &str,
    options: &WalkOptions,
) -> Result<BatchReport, FsOpError> {
    let root = root.as_ref();
    let from = Extension::new(from)?;
    let to = replacement(to)?;
    let mut report = BatchReport::default();

    // Collect first so a renamed file can never come back round in the
    // same directory listing.
    let mut files = walk_with(root, options)?.files();
    let mut matches = Vec::new();
    for entry in files.by_ref() {
        match entry {
            Ok(entry) => {
                report.visited += 1;
                if from.matches(entry.path()) {
                    matches.push(entry.into_path());
                } else {
                    report.unchanged += 1;
                }
            }
            Err(err) => report.record_error(FailureKind::Walk, &err),
        }
    }
    report.skipped += files.skipped();

    for src in matches {
        let dst = src.with_extension(to);
        if dst == src {
            report.unchanged += 1;
            continue;
        }
        match rename_entry(&src, &dst) {
            Ok(()) => {
                tracing::debug!(from = %src.display(), to = %dst.display(), "renamed");
                report.succeeded += 1;
            }
            Err(err @ FsOpError::TargetExists(_)) => {
                report.record_failure(FailureKind::TargetExists, src, &err)
            }
            Err(err) => report.record_failure(FailureKind::Rename, src, &err),
        }
    }

    tracing::info!(root = %root.display(), %from, %report, "extension rename finished");
    Ok(report)
}

/// Rename `src` to `dst`, refusing to replace an existing entry.
///
/// A `dst` that only differs from `src` in letter case and resolves to the
/// same file (a case-insensitive filesystem) is not treated as existing.
pub fn rename_entry(src: &Path, dst: &Path) -> Result<(), FsOpError> {
    if fs::symlink_metadata(dst).is_ok() && !case_variant_of(src, dst) {
        return Err(FsOpError::TargetExists(dst.to_path_buf()));
    }
    let rename_err = |source| FsOpError::Rename {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    };
    if test_hooks::should_fail_rename(src) {
        return Err(rename_err(io::Error::other("forced rename failure")));
    }
    fs::rename(src, dst).map_err(rename_err)
}

fn case_variant_of(src: &Path, dst: &Path) -> bool {
    src.as_os_str().eq_ignore_ascii_case(dst.as_os_str()) && same_entry(src, dst)
}

#[cfg(unix)]
fn same_entry(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
