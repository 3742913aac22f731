use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use tracing::{info, warn};

use crate::apod;
use crate::config;
use crate::data::{ApodMediaService, MediaService, StaticMediaService};
use crate::logging;
use crate::ui;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub demo: bool,
}

pub fn run(options: RunOptions) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    if logging::init(&cfg.log).context("initialize logging")? {
        info!(version = crate::VERSION, config = %display_path, "apod-tui starting");
    }

    let user_agent = if !cfg.source.user_agent.trim().is_empty() {
        cfg.source.user_agent.clone()
    } else {
        format!("apod-tui/{}", crate::VERSION)
    };

    let http = HttpClient::builder()
        .timeout(cfg.source.timeout)
        .user_agent(user_agent.clone())
        .build()
        .context("build HTTP client")?;

    let service: Arc<dyn MediaService> = if options.demo {
        Arc::new(StaticMediaService::demo())
    } else {
        let client = apod::Client::new(apod::ClientConfig {
            source_url: cfg.source.url.clone(),
            user_agent,
            timeout: Some(cfg.source.timeout),
            http_client: Some(http.clone()),
        })
        .context("create media client")?;
        Arc::new(ApodMediaService::new(Arc::new(client)))
    };

    let preview_client = if cfg.ui.image_previews {
        Some(http)
    } else {
        warn!("image previews disabled by configuration");
        None
    };

    let mut model = ui::Model::new(ui::Options {
        service,
        columns: cfg.ui.columns,
        preview_client,
        config_path: display_path,
    });
    model.run()?;

    info!("apod-tui exiting");
    Ok(())
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/apod-tui/config.yaml".to_string()
    }
}
