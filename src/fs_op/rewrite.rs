//! Conditional content rewriting across a directory tree.
//!
//! Every regular file under the root is read into memory and handed to a
//! decision function along with its path. The function answers with a
//! [`Rewrite`]: `NoChange` leaves the file exactly as it was (it is only
//! ever opened for reading), `Changed(content)` replaces the file's content
//! with `content`. Files are processed one at a time; a file that cannot be
//! read or written back is recorded in the [`BatchReport`] and the batch
//! moves on.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fs_op::error::FsOpError;
use crate::fs_op::handle::{OpenFile, OpenMode};
use crate::fs_op::helpers::atomic_replace;
use crate::fs_op::report::{BatchReport, FailureKind};
use crate::fs_op::test_hooks;
use crate::fs_op::walk::{walk_with, TraversalMode, WalkOptions};

/// Answer of a decision function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite<T> {
    /// Leave the file untouched.
    NoChange,
    /// Replace the file's content with this.
    Changed(T),
}

impl<T> Rewrite<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Rewrite::Changed(_))
    }
}

/// How rewritten content reaches the disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteBack {
    /// Truncate the file and write the new content into it. Keeps the
    /// file's identity (inode, ownership); a crash mid-write can leave it
    /// partially written.
    #[default]
    InPlace,
    /// Write a sibling temp file, copy the permissions over and rename it
    /// onto the original. A symlink is resolved first so the link stays in
    /// place and its target gets the new content.
    Atomic,
}

/// Options for the `*_with` rewrite functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    pub walk: WalkOptions,
    pub write_back: WriteBack,
    /// Files larger than this many bytes are skipped without being read.
    pub max_file_size: Option<u64>,
}

impl RewriteOptions {
    pub fn new(mode: TraversalMode) -> Self {
        RewriteOptions {
            walk: WalkOptions::new(mode),
            ..Default::default()
        }
    }

    pub fn with_write_back(mut self, write_back: WriteBack) -> Self {
        self.write_back = write_back;
        self
    }

    pub fn with_max_file_size(mut self, limit: Option<u64>) -> Self {
        self.max_file_size = limit;
        self
    }

    pub fn following_links(mut self, follow: bool) -> Self {
        self.walk.follow_links = follow;
        self
    }
}

enum Outcome {
    Skip(&'static str),
    Keep,
    Write(Vec<u8>),
}

/// Run `decide` over the raw bytes of every regular file under `root`.
///
/// ```no_run
/// use file_batch::fs_op::{rewrite_when, Rewrite, TraversalMode};
/// let report = rewrite_when("/tmp/t", TraversalMode::Recursive, |_path, bytes| {
///     if bytes.ends_with(b"\n") {
///         Rewrite::NoChange
///     } else {
///         let mut fixed = bytes.to_vec();
///         fixed.push(b'\n');
///         Rewrite::Changed(fixed)
///     }
/// })
/// .unwrap();
/// assert!(report.is_clean());
/// ```
pub fn rewrite_when<P, F>(root: P, mode: TraversalMode, decide: F) -> Result<BatchReport, FsOpError>
where
    P: AsRef<Path>,
    F: FnMut(&Path, &[u8]) -> Rewrite<Vec<u8>>,
{
    rewrite_when_with(root, &RewriteOptions::new(mode), decide)
}

/// [`rewrite_when`] with explicit options.
pub fn rewrite_when_with<P, F>(
    root: P,
    options: &RewriteOptions,
    mut decide: F,
) -> Result<BatchReport, FsOpError>
where
    P: AsRef<Path>,
    F: FnMut(&Path, &[u8]) -> Rewrite<Vec<u8>>,
{
    run_batch(root.as_ref(), options, |path, content| match decide(path, &content) {
        Rewrite::NoChange => Outcome::Keep,
        Rewrite::Changed(data) => Outcome::Write(data),
    })
}

/// Like [`rewrite_when`], for text. Files that are not valid UTF-8 are
/// skipped without calling `decide`.
pub fn rewrite_text_when<P, F>(root: P, mode: TraversalMode, decide: F) -> Result<BatchReport, FsOpError>
where
    P: AsRef<Path>,
    F: FnMut(&Path, &str) -> Rewrite<String>,
{
    rewrite_text_when_with(root, &RewriteOptions::new(mode), decide)
}

/// [`rewrite_text_when`] with explicit options.
pub fn rewrite_text_when_with<P, F>(
    root: P,
    options: &RewriteOptions,
    mut decide: F,
) -> Result<BatchReport, FsOpError>
where
    P: AsRef<Path>,
    F: FnMut(&Path, &str) -> Rewrite<String>,
{
    run_batch(root.as_ref(), options, |path, content| match String::from_utf8(content) {
        Ok(text) => match decide(path, &text) {
            Rewrite::NoChange => Outcome::Keep,
            Rewrite::Changed(text) => Outcome::Write(text.into_bytes()),
        },
        Err(_) => Outcome::Skip("not valid UTF-8"),
    })
}

fn run_batch<F>(root: &Path, options: &RewriteOptions, mut decide: F) -> Result<BatchReport, FsOpError>
where
    F: FnMut(&Path, Vec<u8>) -> Outcome,
{
    let mut report = BatchReport::default();
    let mut files = walk_with(root, &options.walk)?.files();

    for entry in files.by_ref() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.record_error(FailureKind::Walk, &err);
                continue;
            }
        };
        report.visited += 1;
        let path = entry.path();

        if let Some(limit) = options.max_file_size {
            if fs::metadata(path).map(|md| md.len() > limit).unwrap_or(false) {
                tracing::debug!(path = %path.display(), limit, "skipping: file too large");
                report.skipped += 1;
                continue;
            }
        }

        let content = match load(path) {
            Ok(content) => content,
            Err(err) if vanished(&err) => {
                tracing::debug!(path = %path.display(), "skipping: file vanished");
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                report.record_failure(FailureKind::Read, path.to_path_buf(), &err);
                continue;
            }
        };

        match decide(path, content) {
            Outcome::Skip(reason) => {
                tracing::debug!(path = %path.display(), reason, "skipping");
                report.skipped += 1;
            }
            Outcome::Keep => report.unchanged += 1,
            Outcome::Write(data) => match write_back(path, &data, options.write_back) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), bytes = data.len(), "rewrote file");
                    report.succeeded += 1;
                }
                Err(err) => report.record_failure(FailureKind::Write, path.to_path_buf(), &err),
            },
        }
    }
    report.skipped += files.skipped();

    tracing::info!(root = %root.display(), %report, "rewrite finished");
    Ok(report)
}

fn load(path: &Path) -> Result<Vec<u8>, FsOpError> {
    if let Some(source) = test_hooks::forced_open_error(path) {
        return Err(FsOpError::Open {
            path: path.to_path_buf(),
            mode: OpenMode::READ_BINARY.to_string(),
            source,
        });
    }
    OpenFile::open(path, OpenMode::READ_BINARY)?.read_to_end()
}

fn vanished(err: &FsOpError) -> bool {
    matches!(err, FsOpError::Open { source, .. } if source.kind() == io::ErrorKind::NotFound)
}

fn write_back(path: &Path, data: &[u8], strategy: WriteBack) -> Result<(), FsOpError> {
    if test_hooks::should_fail_write_back(path) {
        return Err(FsOpError::Write {
            path: path.to_path_buf(),
            source: io::Error::other("forced write-back failure"),
        });
    }
    let write_err = |source: io::Error| FsOpError::Write {
        path: path.to_path_buf(),
        source,
    };
    // Atomic replacement only needs a writable directory, so the file's
    // own permission is checked up front for both strategies.
    if fs::metadata(path).map_err(write_err)?.permissions().readonly() {
        return Err(write_err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "file is read-only",
        )));
    }
    match strategy {
        WriteBack::InPlace => {
            let mut file = OpenFile::open(path, OpenMode::WRITE_BINARY)?;
            file.write_bytes(data)?;
            file.close().map(|_| ())
        }
        WriteBack::Atomic => atomic_replace(path, data).map_err(write_err),
    }
}
