use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fs_op::{RewriteOptions, TraversalMode, WalkOptions, WriteBack};
use crate::settings::SettingsError;

/// Defaults for the `filebatch` commands. Every field can be overridden on
/// the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Follow symbolic links to directories while walking.
    pub follow_links: bool,
    pub write_back: WriteBack,
    /// Skip files larger than this many bytes when rewriting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    /// Log level used when neither `-v` nor `RUST_LOG` is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Settings {
    pub fn traversal(&self) -> TraversalMode {
        TraversalMode::from(self.recursive)
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            mode: self.traversal(),
            follow_links: self.follow_links,
        }
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            walk: self.walk_options(),
            write_back: self.write_back,
            max_file_size: self.max_file_size,
        }
    }
}

/// Write `settings` to `path` as TOML, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let text = toml::to_string_pretty(settings)?;
    let write_err = |source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, text).map_err(write_err)?;
    tracing::debug!(path = %path.display(), "saved settings");
    Ok(())
}
