use thiserror::Error;
use std::path::{Path, PathBuf};

/// Errors produced by the stream handle, the tree walker and the batch
/// operations built on top of them.
///
/// Batch operations only return these for problems with their arguments or
/// the root directory; per-entry problems are collected into a
/// [`BatchReport`](crate::fs_op::report::BatchReport) instead.
#[derive(Error, Debug)]
pub enum FsOpError {
    /// Wrapper for underlying IO errors without extra context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening a stream failed.
    #[error("cannot open `{}` with mode \"{mode}\": {source}", .path.display())]
    Open {
        path: PathBuf,
        mode: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an open stream failed.
    #[error("cannot read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an open stream (or flushing it) failed.
    #[error("cannot write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rename from `src` to `dst` failed.
    #[error("cannot rename `{}` to `{}`: {source}", .src.display(), .dst.display())]
    Rename {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rename target is already taken by another entry.
    #[error("target already exists: {}", .0.display())]
    TargetExists(PathBuf),

    /// The walk root does not exist.
    #[error("root path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The walk root exists but is not a directory.
    #[error("root path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A mode string that is not one of the platform stream modes.
    #[error("invalid open mode \"{0}\"")]
    InvalidMode(String),

    /// An extension argument that is not of the form `.ext`.
    #[error("invalid extension \"{0}\": expected a leading dot followed by a name")]
    InvalidExtension(String),

    /// An entry could not be read during a walk.
    #[error("walk error at `{}`: {msg}", .path.display())]
    Walk { path: PathBuf, msg: String },

    /// A scan pattern with an unmatched brace.
    #[error("invalid scan format \"{0}\": unmatched brace")]
    InvalidScanFormat(String),

    /// A scanned field could not be parsed into the requested type.
    #[error("cannot parse field {index} (\"{value}\"): {msg}")]
    Parse {
        index: usize,
        value: String,
        msg: String,
    },

    /// Generic error with context message.
    #[error("Filesystem operation failed: {0}")]
    Message(String),
}

impl FsOpError {
    /// The filesystem path this error is about, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FsOpError::Open { path, .. }
            | FsOpError::Read { path, .. }
            | FsOpError::Write { path, .. }
            | FsOpError::Walk { path, .. } => Some(path),
            FsOpError::Rename { src, .. } => Some(src),
            FsOpError::TargetExists(p)
            | FsOpError::RootNotFound(p)
            | FsOpError::NotADirectory(p) => Some(p),
            _ => None,
        }
    }
}

impl From<String> for FsOpError {
    fn from(s: String) -> Self {
        FsOpError::Message(s)
    }
}

impl From<walkdir::Error> for FsOpError {
    fn from(e: walkdir::Error) -> Self {
        FsOpError::Walk {
            path: e.path().map(|p| p.to_path_buf()).unwrap_or_default(),
            msg: e.to_string(),
        }
    }
}
