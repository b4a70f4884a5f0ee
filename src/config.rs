use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:2025";
pub const API_URL_ENV: &str = "JOBTRACK_API_URL";

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// File values, then the environment, then the command line.
    pub fn resolve(path: &Path, env_url: Option<String>, cli_url: Option<&str>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            config.api_base_url = url;
        }
        if let Some(url) = cli_url {
            config.api_base_url = url.to_string();
        }
        config.api_base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        Ok(config)
    }
}

/// Where jobtrack keeps its few local files.
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppDirs {
    pub fn discover() -> Self {
        // Use XDG directories or fall back to the working directory
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrack") {
            Self {
                config_dir: proj_dirs.config_dir().to_path_buf(),
                data_dir: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            Self::at(Path::new("."))
        }
    }

    /// Everything under one directory; used by tests and the fallback.
    pub fn at(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            data_dir: root.to_path_buf(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn theme_file(&self) -> PathBuf {
        self.data_dir.join("theme")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("jobtrack.log")
    }
}
