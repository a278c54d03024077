//! Where lumen-choreo keeps its files.
//!
//! `settings.toml` and the optional `dictionary.json` live under the platform
//! config directory (`dirs::config_dir`). Exported session logs go to a
//! `sessions/` folder under the local data directory (`dirs::data_local_dir`).
//! Both roots fall back to the working directory when the platform has none.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "lumen-choreo";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    /// Extra word → shape rows merged over the built-in dictionary.
    pub dictionary_file: PathBuf,
    /// Semantic event logs, one JSON file per session.
    pub sessions_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let config_root = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let data_root = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::rooted(&config_root.join(APP_DIR), &data_root.join(APP_DIR))
    }

    /// Layout under explicit roots instead of the platform directories.
    pub fn rooted(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            settings_file: config_dir.join("settings.toml"),
            dictionary_file: config_dir.join("dictionary.json"),
            sessions_dir: data_dir.join("sessions"),
        }
    }

    /// Export path for a session that ended `stamp` seconds after the epoch.
    pub fn session_file(&self, stamp: u64) -> PathBuf {
        self.sessions_dir.join(format!("session-{stamp}.json"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
