use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::fs_op::error::FsOpError;

/// Which step of a batch operation failed for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The entry could not be enumerated.
    Walk,
    /// The file could not be opened or read.
    Read,
    /// The rewritten content could not be written back.
    Write,
    /// The rename itself failed.
    Rename,
    /// A rename was refused because the target already exists.
    TargetExists,
}

/// One entry a batch operation could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregate outcome of one batch call.
///
/// `visited` counts the regular files the operation looked at. Each of
/// them ends up in exactly one of `succeeded`, `unchanged`, `skipped` or
/// `failures`, except that `skipped` also counts entries the walk itself
/// skipped for lack of permission, and `failures` also holds walk errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub visited: usize,
    /// Files renamed or rewritten.
    pub succeeded: usize,
    /// Files that did not match or that the decision function left alone.
    pub unchanged: usize,
    pub skipped: usize,
    pub failures: Vec<EntryFailure>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// No entry failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record_failure(&mut self, kind: FailureKind, path: PathBuf, err: &FsOpError) {
        tracing::warn!(path = %path.display(), ?kind, error = %err, "entry failed");
        self.failures.push(EntryFailure {
            path,
            kind,
            message: err.to_string(),
        });
    }

    /// Record a failure whose path comes from the error itself.
    pub(crate) fn record_error(&mut self, kind: FailureKind, err: &FsOpError) {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        self.record_failure(kind, path, err);
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visited, {} succeeded, {} unchanged, {} skipped, {} failed",
            self.visited,
            self.succeeded,
            self.unchanged,
            self.skipped,
            self.failed()
        )
    }
}
