pub mod config_dirs;
pub mod read_settings;
pub mod write_settings;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// Re-export commonly used types/functions for convenience
pub use config_dirs::{default_settings_path, project_config_dir};
pub use read_settings::load_settings;
pub use write_settings::{save_settings, Settings};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid settings in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write settings to {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("no configuration directory available for this user")]
    NoConfigDir,
}
