mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./posterwall.toml",
        "~/.config/posterwall/config.toml",
        "/etc/posterwall/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let library = &config.library;
    if library.resolver_concurrency == 0 {
        anyhow::bail!("library.resolver_concurrency must be at least 1");
    }
    if library.scan_interval_minutes > MAX_SCAN_INTERVAL_MINUTES {
        anyhow::bail!(
            "library.scan_interval_minutes must be at most {MAX_SCAN_INTERVAL_MINUTES}, got {}",
            library.scan_interval_minutes
        );
    }
    if library.movies_subpath == library.tv_subpath {
        anyhow::bail!(
            "library.movies_subpath and library.tv_subpath must differ (both {:?})",
            library.movies_subpath
        );
    }
    if !library.share_root.exists() {
        tracing::warn!("Share root does not exist: {:?}", library.share_root);
    }

    let catalog = &config.catalog;
    for (name, value) in [
        ("confidence_threshold", catalog.confidence_threshold),
        ("similarity_threshold", catalog.similarity_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            anyhow::bail!("catalog.{name} must be between 0 and 1, got {value}");
        }
    }
    if catalog.request_timeout_secs == 0 {
        anyhow::bail!("catalog.request_timeout_secs must be at least 1");
    }
    if catalog.api_key.is_empty() {
        tracing::warn!("No catalog API key configured; metadata lookups will fail");
    }

    if config.retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be at least 1");
    }
    if config.retry.factor == 0 {
        anyhow::bail!("retry.factor must be at least 1");
    }

    Ok(())
}
