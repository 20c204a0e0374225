use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::validate_config;
use crate::error::{Error, Result};

pub const ENV_LOG_LEVEL: &str = "ARAZZO_LOG_LEVEL";
pub const ENV_CACHE_TTL_SECS: &str = "ARAZZO_CACHE_TTL_SECS";
pub const ENV_DISCOVERY_MAX_DEPTH: &str = "ARAZZO_DISCOVERY_MAX_DEPTH";

pub fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::Config(format!("failed to read config '{}': {err}", path.display()))
    })?;

    toml::from_str(&content).map_err(|err| {
        Error::Config(format!(
            "failed to parse config '{}': {err}",
            path.display()
        ))
    })
}

pub fn load_from_env(config: ServiceConfig) -> Result<ServiceConfig> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Applies overrides from `lookup`; blank values are ignored.
pub fn apply_overrides<F>(mut config: ServiceConfig, lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(level) = value(ENV_LOG_LEVEL) {
        config.log_level = level;
    }
    if let Some(raw) = value(ENV_CACHE_TTL_SECS) {
        config.cache.ttl_seconds = parse_number(ENV_CACHE_TTL_SECS, &raw)?;
    }
    if let Some(raw) = value(ENV_DISCOVERY_MAX_DEPTH) {
        config.discovery.max_depth = parse_number(ENV_DISCOVERY_MAX_DEPTH, &raw)?;
    }

    Ok(config)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

/// File (or defaults when `path` is `None`), then environment, then validation.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig> {
    let base = match path {
        Some(path) => load_from_file(path)?,
        None => ServiceConfig::default(),
    };
    let config = load_from_env(base)?;
    validate_config(&config)?;
    Ok(config)
}
