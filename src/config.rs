use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::rule::DEFAULT_COLOR;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_BOOTSTRAP_DELAY_MS: u64 = 2000;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub db_path: Option<String>,
    /// Inbox snapshot files, tried in order during discovery.
    #[serde(default)]
    pub inbox_paths: Vec<String>,
    pub default_color: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub bootstrap_delay_ms: Option<u64>,
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("rs_mail_labeler"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn default_db_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("rules.db");
    Ok(p)
}

pub fn default_inbox_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("inbox.json"))
}

/// Loads the user config, writing a template first if there is none.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config {
            db_path: None,
            inbox_paths: Vec::new(),
            default_color: Some(DEFAULT_COLOR.to_string()),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            bootstrap_delay_ms: Some(DEFAULT_BOOTSTRAP_DELAY_MS),
        };
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(path, tom)?;
        info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn resolve_db_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.db_path {
        Ok(PathBuf::from(p))
    } else {
        default_db_path()
    }
}

pub fn resolve_inbox_paths(cfg: &Config) -> Result<Vec<PathBuf>> {
    if cfg.inbox_paths.is_empty() {
        Ok(vec![default_inbox_path()?])
    } else {
        Ok(cfg.inbox_paths.iter().map(PathBuf::from).collect())
    }
}

impl Config {
    pub fn default_color(&self) -> &str {
        self.default_color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn bootstrap_delay(&self) -> Duration {
        Duration::from_millis(
            self.bootstrap_delay_ms
                .unwrap_or(DEFAULT_BOOTSTRAP_DELAY_MS),
        )
    }
}
