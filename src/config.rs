use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::manager::AddPolicy;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the task gateway.
    pub api_url: String,
    /// Where the session cookie is kept between invocations.
    pub session_file: Option<PathBuf>,
    /// Directory for the TUI's log files.
    pub log_dir: Option<PathBuf>,
    pub add_policy: AddPolicy,
    /// Per-request timeout. Requests wait indefinitely when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: None,
            log_dir: None,
            add_policy: AddPolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads the config file, in order: `explicit`, `TODUST_CONFIG`, then
    /// `<config_dir>/todust/config.toml` when it exists. `TODUST_API_URL`
    /// overrides the file's `api_url`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match config_path(explicit) {
            Some(path) => {
                info!(path = %path.display(), "loading config");
                Self::from_file(&path)?
            }
            None => {
                debug!("no config file; using defaults");
                Config::default()
            }
        };

        if let Ok(url) = std::env::var("TODUST_API_URL") {
            if !url.trim().is_empty() {
                debug!(%url, "api_url overridden from environment");
                cfg.api_url = url;
            }
        }
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("todust");
            p.push("logs");
            p
        })
    }
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("TODUST_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let mut p = dirs::config_dir()?;
    p.push("todust");
    p.push("config.toml");
    p.exists().then_some(p)
}
