use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

// File only: the terminal belongs to the UI.
pub fn init(cfg: &LogConfig) -> Result<bool> {
    let Some(path) = cfg.file.as_deref() else {
        return Ok(false);
    };
    install(path, &cfg.level)?;
    Ok(true)
}

fn install(path: &Path, level: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("log: failed to create directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("log: failed to open {}", path.display()))?;

    let filter = EnvFilter::try_new(level.trim())
        .with_context(|| format!("log: invalid level filter {level:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("log: failed to install subscriber: {err}"))
}
