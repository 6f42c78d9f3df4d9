use std::fs::{self, FileType};
use std::path::Path;

use serde::Serialize;

/// Lightweight classification of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Anything else: sockets, FIFOs, devices, dangling symlinks.
    Other,
}

impl EntryKind {
    /// Classify a file type as reported without following symlinks.
    /// A symlink itself is `Other`; use [`EntryKind::of`] to classify its
    /// target.
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_file() {
            EntryKind::File
        } else if ft.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        }
    }

    /// Classify `path`, following symlinks. Returns `None` when the path
    /// (or a symlink's target) does not exist or cannot be inspected.
    pub fn of<P: AsRef<Path>>(path: P) -> Option<Self> {
        fs::metadata(path.as_ref())
            .ok()
            .map(|md| EntryKind::from_file_type(md.file_type()))
    }
}
