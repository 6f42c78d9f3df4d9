use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::fs_op::error::FsOpError;

/// Check that `root` exists and is a directory before a walk starts.
///
/// A missing root and a root that is not a directory are reported as
/// distinct errors; any other failure to inspect the root is a walk error.
pub fn validate_root(root: &Path) -> Result<PathBuf, FsOpError> {
    match fs::metadata(root) {
        Ok(md) if md.is_dir() => Ok(root.to_path_buf()),
        Ok(_) => Err(FsOpError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(FsOpError::RootNotFound(root.to_path_buf()))
        }
        Err(e) => Err(FsOpError::Walk {
            path: root.to_path_buf(),
            msg: e.to_string(),
        }),
    }
}

/// Resolve and validate a user-supplied root directory.
///
/// Behaviour:
/// - Empty `input` is reported as a missing root.
/// - `~` alone or followed by a separator is expanded to the user's home
///   directory (uses `HOME` or `USERPROFILE` environment variables).
///   `~name` is an ordinary relative path.
/// - Absolute paths are used as-is; relative paths are resolved against
///   `base`.
/// - The result must exist and be a directory (see [`validate_root`]).
pub fn resolve_root(input: &str, base: &Path) -> Result<PathBuf, FsOpError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FsOpError::RootNotFound(PathBuf::new()));
    }

    let candidate = if let Some(rest) = home_relative(input) {
        expand_tilde(rest)
            .ok_or_else(|| FsOpError::Message("could not determine home directory".into()))?
    } else {
        let p = PathBuf::from(input);
        if p.is_absolute() {
            p
        } else {
            base.join(p)
        }
    };

    validate_root(&candidate)
}

// The part after `~` for `~`, `~/...` and `~\...`; `None` for anything else.
fn home_relative(input: &str) -> Option<&str> {
    let rest = input.strip_prefix('~')?;
    if rest.is_empty() || rest.starts_with(['/', '\\']) {
        Some(rest.trim_start_matches(['/', '\\']))
    } else {
        None
    }
}

// Join `rest` onto the user's home directory. Returns `None` when the home
// directory cannot be determined.
fn expand_tilde(rest: &str) -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    let mut p = PathBuf::from(home);
    if !rest.is_empty() {
        p.push(rest);
    }
    Some(p)
}
