use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagepilot_task_core::{AgentConfig, HttpLlmConfig};

const LOCAL_CONFIG: &str = "config/pagepilot.yaml";

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// On-disk configuration: agent pacing plus the completion endpoint,
/// both optional and independently defaulted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub agent: AgentConfig,
    pub llm: HttpLlmConfig,
}

/// Load `--config`, else `config/pagepilot.yaml` when present, else
/// defaults.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfig> {
    let path = match path {
        Some(path) => path.clone(),
        None => {
            let local = PathBuf::from(LOCAL_CONFIG);
            if !local.exists() {
                return Ok(FileConfig::default());
            }
            local
        }
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: FileConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}
