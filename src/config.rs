use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::apod;
use crate::gallery::MAX_COLUMNS;

const DEFAULT_ENV_PREFIX: &str = "APOD_TUI";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ui: UIConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_source_url() -> String {
    apod::DEFAULT_SOURCE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("apod-tui/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    apod::DEFAULT_TIMEOUT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UIConfig {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_image_previews")]
    pub image_previews: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            image_previews: default_image_previews(),
        }
    }
}

fn default_columns() -> usize {
    3
}

fn default_image_previews() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let path = options.config_file.clone().or_else(default_config_path);
    let mut cfg = match path {
        Some(path) if path.exists() => read_config_file(&path)?,
        _ => Config::default(),
    };

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    for (key, value) in env_overrides(prefix) {
        apply_env_value(&mut cfg, &key, value);
    }

    if cfg.ui.columns == 0 {
        cfg.ui.columns = default_columns();
    }
    cfg.ui.columns = cfg.ui.columns.min(MAX_COLUMNS);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn env_overrides(prefix: &str) -> HashMap<String, String> {
    let upper_prefix = format!("{}_", prefix.to_uppercase());
    env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(&upper_prefix)
                .map(|stripped| (stripped.to_ascii_lowercase().replace("__", "."), value))
        })
        .collect()
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "source.url" => cfg.source.url = value,
        "source.user_agent" => cfg.source.user_agent = value,
        "source.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.source.timeout = duration;
            }
        }
        "ui.columns" => {
            if let Ok(parsed) = value.parse::<usize>() {
                cfg.ui.columns = parsed;
            }
        }
        "ui.image_previews" => {
            cfg.ui.image_previews = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        "log.file" => {
            cfg.log.file = if value.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "log.level" => cfg.log.level = value,
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("apod-tui").join("config.yaml"))
}
