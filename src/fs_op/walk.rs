//! Lazy directory-tree enumeration.
//!
//! [`walk`] yields every entry below a root (never the root itself), either
//! just the root's direct children or the whole subtree depth-first.
//! Entries the process is not allowed to read are skipped and counted
//! instead of ending the walk, so one locked subtree does not hide its
//! siblings. Any other enumeration failure is yielded as an `Err` item and
//! the walk carries on with the next entry.
//!
//! Order is whatever the OS returns. A walk is single-use; start a new one
//! for each traversal.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::fs_op::error::FsOpError;
use crate::fs_op::path::validate_root;
use crate::fs_op::stat::EntryKind;

/// Whether a walk descends into subdirectories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Only the root's direct children.
    #[default]
    Shallow,
    /// The whole subtree, without a depth limit.
    Recursive,
}

impl TraversalMode {
    pub fn is_recursive(self) -> bool {
        self == TraversalMode::Recursive
    }

    fn max_depth(self) -> usize {
        match self {
            TraversalMode::Shallow => 1,
            TraversalMode::Recursive => usize::MAX,
        }
    }
}

impl From<bool> for TraversalMode {
    fn from(recursive: bool) -> Self {
        if recursive {
            TraversalMode::Recursive
        } else {
            TraversalMode::Shallow
        }
    }
}

/// Options for [`walk_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    pub mode: TraversalMode,
    /// Descend through symlinked directories. Loops are reported as walk
    /// errors.
    pub follow_links: bool,
}

impl WalkOptions {
    pub fn new(mode: TraversalMode) -> Self {
        WalkOptions {
            mode,
            follow_links: false,
        }
    }
}

/// One entry produced by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    path: PathBuf,
    kind: EntryKind,
    depth: usize,
}

impl WalkEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Symlinks are classified by their target; a dangling link is
    /// [`EntryKind::Other`].
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// 1 for the root's direct children.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Iterator over the entries below a root. See the module docs.
pub struct Walk {
    inner: walkdir::IntoIter,
    skipped: usize,
}

impl std::fmt::Debug for Walk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walk").field("skipped", &self.skipped).finish()
    }
}

/// Start a walk of `root`.
pub fn walk<P: AsRef<Path>>(root: P, mode: TraversalMode) -> Result<Walk, FsOpError> {
    walk_with(root, &WalkOptions::new(mode))
}

/// Start a walk of `root` with explicit options.
///
/// Fails with [`FsOpError::RootNotFound`] or [`FsOpError::NotADirectory`]
/// before producing anything when the root is unusable.
pub fn walk_with<P: AsRef<Path>>(root: P, options: &WalkOptions) -> Result<Walk, FsOpError> {
    let root = validate_root(root.as_ref())?;
    let inner = WalkDir::new(root)
        .min_depth(1)
        .max_depth(options.mode.max_depth())
        .follow_links(options.follow_links)
        .into_iter();
    Ok(Walk { inner, skipped: 0 })
}

impl Walk {
    /// Entries skipped so far because access was denied.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Restrict the walk to regular files.
    pub fn files(self) -> Files {
        Files { walk: self }
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEntry, FsOpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => return Some(Ok(classify(entry))),
                Err(err) if is_permission_denied(&err) => {
                    self.skipped += 1;
                    tracing::debug!(path = ?err.path(), "skipping entry: permission denied");
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// A [`Walk`] restricted to regular files.
#[derive(Debug)]
pub struct Files {
    walk: Walk,
}

impl Files {
    pub fn skipped(&self) -> usize {
        self.walk.skipped()
    }
}

impl Iterator for Files {
    type Item = Result<WalkEntry, FsOpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walk.next()? {
                Ok(entry) if !entry.is_file() => continue,
                other => return Some(other),
            }
        }
    }
}

fn is_permission_denied(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == io::ErrorKind::PermissionDenied)
        .unwrap_or(false)
}

fn classify(entry: walkdir::DirEntry) -> WalkEntry {
    let kind = if entry.path_is_symlink() && entry.file_type().is_symlink() {
        EntryKind::of(entry.path()).unwrap_or(EntryKind::Other)
    } else {
        EntryKind::from_file_type(entry.file_type())
    };
    let depth = entry.depth();
    WalkEntry {
        path: entry.into_path(),
        kind,
        depth,
    }
}
