//! Where sheet-cmd keeps its two JSON documents.
//!
//! Linux `~/.config/sheet-cmd`, macOS `~/Library/Preferences/sheet-cmd`,
//! Windows `%APPDATA%\sheet-cmd`. `SHEET_CMD_CONFIG_DIR` overrides all of them.

use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "sheet-cmd";
pub const CONFIG_DIR_ENV: &str = "SHEET_CMD_CONFIG_DIR";
pub const USER_METADATA_FILE_NAME: &str = "user_metadata.json";
pub const SETTINGS_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("could not determine home directory")]
    NoHome,
}

/// Resolved locations of the config directory and its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub user_metadata_file: PathBuf,
    pub default_settings_file: PathBuf,
}

impl ConfigPaths {
    /// Paths rooted at an explicit directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let config_dir = dir.as_ref().to_path_buf();
        Self {
            user_metadata_file: config_dir.join(USER_METADATA_FILE_NAME),
            default_settings_file: config_dir.join(SETTINGS_FILE_NAME),
            config_dir,
        }
    }

    /// Paths for the current user, honoring `SHEET_CMD_CONFIG_DIR`.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self::in_dir(config_dir()?))
    }
}

/// The sheet-cmd config directory for the current user.
pub fn config_dir() -> Result<PathBuf, PathError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let base = directories::BaseDirs::new().ok_or(PathError::NoHome)?;
    Ok(base.preference_dir().join(APP_NAME))
}
