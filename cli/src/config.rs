use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tsundoku_api::DEFAULT_AUTH_COOKIE;

/// Placeholder secret written into fresh config files.
pub const PLACEHOLDER_SECRET: &str = "change-me";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub auth_cookie: String,
    pub lock_timeout_ms: u64,
    pub busy_timeout_ms: u64,
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            database_path: PathBuf::from("tsundoku.db"),
            jwt_secret: PLACEHOLDER_SECRET.to_string(),
            auth_cookie: DEFAULT_AUTH_COOKIE.to_string(),
            lock_timeout_ms: 5_000,
            busy_timeout_ms: 5_000,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret == PLACEHOLDER_SECRET
    }
}

/// Read the config at `path`, writing the defaults there first if it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let toml = toml::to_string(&config).context("Failed to serialize default config")?;
        fs::write(path, toml)
            .with_context(|| format!("Failed to write default config to {}", path.display()))?;
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
}
