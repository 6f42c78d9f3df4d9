use std::path::PathBuf;

use directories_next::ProjectDirs;

use crate::settings::SettingsError;

const QUALIFIER: &str = "";
const ORGANIZATION: &str = "";
const APPLICATION: &str = "filebatch";
const SETTINGS_FILE: &str = "settings.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Per-user configuration directory, e.g. `~/.config/filebatch` on Linux.
pub fn project_config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Where settings live when `--config` is not given.
pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    project_config_dir()
        .map(|dir| dir.join(SETTINGS_FILE))
        .ok_or(SettingsError::NoConfigDir)
}
