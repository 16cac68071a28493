//! Limit configuration and its on-disk store.

use crate::constants::{CONFIG_FILE_NAME, SOCKET_FILE_NAME};
use crate::error::AppError;
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A configured limit for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLimit {
    /// Human-readable label
    pub username: String,
    /// Key reported by the active-app source
    pub system_name: String,
    /// Minutes of foreground time before an alert; `<= 0` disables monitoring
    pub limit: i64,
}

impl AppLimit {
    pub fn new(username: &str, system_name: &str, limit: i64) -> Self {
        Self {
            username: username.to_string(),
            system_name: system_name.to_string(),
            limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub apps: Vec<AppLimit>,
}

impl AppConfig {
    /// Limits written on first start.
    pub fn with_defaults() -> Self {
        Self {
            apps: vec![
                AppLimit::new("Firefox", "firefox", 60),
                AppLimit::new("VScode", "code", 60),
            ],
        }
    }

    /// Replace the entry for `entry.system_name`, or append it if there is none.
    pub fn upsert(&mut self, entry: AppLimit) {
        match self
            .apps
            .iter_mut()
            .find(|app| app.system_name == entry.system_name)
        {
            Some(existing) => *existing = entry,
            None => self.apps.push(entry),
        }
    }
}

/// Durable storage for [`AppConfig`].
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<AppConfig, AppError>;
    fn save(&self, config: &AppConfig) -> Result<(), AppError>;
}

/// Stores the config as YAML at a fixed path.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<AppConfig, AppError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| AppError::config_io(&self.path, e))?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn save(&self, config: &AppConfig) -> Result<(), AppError> {
        let yaml = serde_yaml::to_string(config)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::config_io(parent, e))?;
        }
        fs::write(&self.path, yaml).map_err(|e| AppError::config_io(&self.path, e))
    }
}

/// Load the config, falling back to (and persisting) the defaults if it is
/// missing or unreadable.
pub fn load_or_default(store: &dyn ConfigStore) -> AppConfig {
    match store.load() {
        Ok(config) => config,
        Err(e) => {
            info!("Config load failed ({e}), creating default config");
            let config = AppConfig::with_defaults();
            // Best effort: the daemon runs on the in-memory defaults either way.
            if let Err(save_err) = store.save(&config) {
                warn!("Failed to save default config: {save_err}");
            }
            config
        }
    }
}

/// Filesystem locations used by the daemon and its client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub socket: PathBuf,
}

impl AppPaths {
    /// Resolve paths under the per-user config directory (`~/.config/appmon` on Linux).
    pub fn resolve() -> Result<Self, AppError> {
        let proj_dirs = ProjectDirs::from("", "", "appmon").ok_or(AppError::NoConfigDir)?;
        Ok(Self::in_dir(proj_dirs.config_dir()))
    }

    /// Default paths with either location replaced. The config directory is
    /// only resolved when at least one of them is left at its default.
    pub fn with_overrides(
        config_file: Option<PathBuf>,
        socket: Option<PathBuf>,
    ) -> Result<Self, AppError> {
        match (config_file, socket) {
            (Some(config_file), Some(socket)) => Ok(Self {
                config_file,
                socket,
            }),
            (config_file, socket) => {
                let defaults = Self::resolve()?;
                Ok(Self {
                    config_file: config_file.unwrap_or(defaults.config_file),
                    socket: socket.unwrap_or(defaults.socket),
                })
            }
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_file: dir.join(CONFIG_FILE_NAME),
            socket: dir.join(SOCKET_FILE_NAME),
        }
    }

    /// Create the directory holding the config file and socket.
    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for path in [&self.config_file, &self.socket] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| AppError::config_io(parent, e))?;
            }
        }
        Ok(())
    }
}
