use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Option<String>,
    pub state_file: PathBuf,
    pub http_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        let state_file = env::var("CARBON_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Store::default_path());

        let http_timeout = env::var("CARBON_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| warn!("Invalid CARBON_HTTP_TIMEOUT_SECS value {raw:?}: {e}"))
                    .ok()
            })
            .map(Duration::from_secs);

        let api_url = env::var("CARBON_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        info!(state_file = %state_file.display(), api_url = ?api_url, "configuration loaded");

        Self {
            api_url,
            state_file,
            http_timeout,
        }
    }

    pub fn api_url(&self) -> anyhow::Result<&str> {
        self.api_url
            .as_deref()
            .context("CARBON_API_URL must be set to the activity API base URL")
    }
}
