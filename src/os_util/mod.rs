//! Platform capabilities used next to the batch operations.
//!
//! Each capability is available on every target. Where the host has no
//! native implementation the call fails with [`PlatformError::Unsupported`]
//! instead of the crate refusing to build.

pub mod popup;
pub mod shortcut;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fs_op::FsOpError;

pub use popup::{platform_popup, MessageKind, MessagePopup, SystemPopup};
pub use shortcut::{create_shortcut, rating_value, UrlShortcut};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Stream(#[from] FsOpError),
}

/// Absolute path of the running executable.
pub fn executable_path() -> Result<PathBuf, PlatformError> {
    Ok(std::env::current_exe()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_path_is_absolute_and_exists() {
        let exe = executable_path().unwrap();
        assert!(exe.is_absolute());
        assert!(exe.exists());
    }

    #[test]
    fn unsupported_names_the_capability() {
        let err = PlatformError::Unsupported("message popups");
        assert_eq!(err.to_string(), "message popups is not supported on this platform");
    }
}
