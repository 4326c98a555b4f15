//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod engines;
pub mod output;
pub mod parse;
pub mod process;

use std::path::PathBuf;

use taxdoc_core::{ConfigHandle, GatewayConfig};
use tracing::debug;

/// `<config dir>/taxdoc/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taxdoc")
        .join("config.json")
}

/// Path given with `--config`, or the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load, apply environment overrides and validate.
///
/// An explicit path must exist; the default location falls back to defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<ConfigHandle> {
    let path = config_path(explicit);

    if explicit.is_some() || path.exists() {
        return ConfigHandle::load(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e));
    }

    debug!("No config file at {}, using defaults", path.display());
    let config = GatewayConfig::default().with_env_overrides();
    config.validate()?;
    Ok(ConfigHandle::new(config))
}
