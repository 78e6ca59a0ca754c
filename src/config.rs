/*
 * Application settings: where the analysis service lives, how long a request
 * may take, where downloaded workbooks go and how verbose logging is.
 *
 * Settings are read from `config.json` in the platform configuration
 * directory (see `directories::ProjectDirs`). A missing file means defaults;
 * environment variables override whatever the file says.
 */
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const APP_NAME: &str = "SheetChecker";
const CONFIG_FILENAME: &str = "config.json";
pub const SERVICE_URL_ENV: &str = "SHEET_CHECKER_SERVICE_URL";
pub const LOG_LEVEL_ENV: &str = "SHEET_CHECKER_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub download_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 60,
            download_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Loads the platform config file and applies environment overrides. A
    /// missing file is created with defaults so it can be edited; a broken
    /// one is replaced by defaults. Runs before logging is up, so problems are
    /// returned for the caller to log.
    pub fn load() -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut config = match Self::config_path() {
            Some(path) => Self::load_or_create(&path, &mut warnings),
            None => {
                warnings.push("No configuration directory available, using defaults".to_string());
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        (config, warnings)
    }

    fn load_or_create(path: &Path, warnings: &mut Vec<String>) -> Self {
        if !path.exists() {
            let defaults = Self::default();
            if let Err(e) = defaults.save_to(path) {
                warnings.push(format!(
                    "Could not write default configuration to {:?}: {}",
                    path, e
                ));
            }
            return defaults;
        }
        Self::load_from(path).unwrap_or_else(|e| {
            warnings.push(format!("Ignoring configuration at {:?}: {}", path, e));
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("Configuration file {:?} does not exist", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        log::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SERVICE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.service_url = url;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = level;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Configured directory, else the user's download folder, else the
    /// working directory.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(|| UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf)))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
