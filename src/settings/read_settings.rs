use std::fs;
use std::io;
use std::path::Path;

use crate::settings::{default_settings_path, Settings, SettingsError};

/// Load settings from `path`, or from the default location when `None`.
///
/// A missing file yields the defaults. A file that exists but cannot be
/// read or parsed is an error; unknown keys are rejected.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_settings_path() {
            Ok(p) => p,
            Err(SettingsError::NoConfigDir) => return Ok(Settings::default()),
            Err(e) => return Err(e),
        },
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        Err(source) => return Err(SettingsError::Read { path, source }),
    };

    toml::from_str(&text).map_err(|source| SettingsError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_op::WriteBack;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let td = tempdir().unwrap();
        let s = load_settings(Some(&td.path().join("absent.toml"))).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let td = tempdir().unwrap();
        let p = td.path().join("settings.toml");
        fs::write(&p, "write_back = \"atomic\"\n").unwrap();
        let s = load_settings(Some(&p)).unwrap();
        assert_eq!(s.write_back, WriteBack::Atomic);
        assert!(!s.recursive);
        assert_eq!(s.max_file_size, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let td = tempdir().unwrap();
        let p = td.path().join("settings.toml");
        fs::write(&p, "recursive = true\ncolour = \"blue\"\n").unwrap();
        let err = load_settings(Some(&p)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("settings.toml"));
    }
}
