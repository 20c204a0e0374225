use crate::config::schema::ServiceConfig;
use crate::error::{Error, Result};

pub const MAX_DISCOVERY_DEPTH: usize = 8;

pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    if config.cache.ttl_seconds == 0 {
        return Err(Error::Config(
            "cache.ttl_seconds must be greater than zero".to_owned(),
        ));
    }

    let discovery = &config.discovery;
    if discovery.max_depth > MAX_DISCOVERY_DEPTH {
        return Err(Error::Config(format!(
            "discovery.max_depth must be at most {MAX_DISCOVERY_DEPTH}, got {}",
            discovery.max_depth
        )));
    }

    if discovery.marker_bytes == 0 {
        return Err(Error::Config(
            "discovery.marker_bytes must be greater than zero".to_owned(),
        ));
    }

    if discovery.extensions.is_empty() {
        return Err(Error::Config(
            "discovery.extensions must list at least one extension".to_owned(),
        ));
    }

    for extension in &discovery.extensions {
        let trimmed = extension.trim();
        if trimmed.is_empty() || trimmed.starts_with('.') {
            return Err(Error::Config(format!(
                "discovery extension '{extension}' must be a bare name such as 'yaml'"
            )));
        }
    }

    if config.diagnostics.source.trim().is_empty() {
        return Err(Error::Config(
            "diagnostics.source cannot be empty".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_config;
    use crate::config::schema::ServiceConfig;

    #[test]
    fn accepts_default_config() {
        validate_config(&ServiceConfig::default()).expect("defaults should be valid");
    }

    #[test]
    fn rejects_zero_ttl() {
        let mut config = ServiceConfig::default();
        config.cache.ttl_seconds = 0;

        let error = validate_config(&config).expect_err("zero ttl should fail");
        assert!(error.to_string().contains("ttl_seconds"));
    }

    #[test]
    fn rejects_excessive_depth() {
        let mut config = ServiceConfig::default();
        config.discovery.max_depth = 9;

        let error = validate_config(&config).expect_err("depth 9 should fail");
        assert!(error.to_string().contains("max_depth must be at most 8"));
    }

    #[test]
    fn rejects_empty_or_dotted_extensions() {
        let mut config = ServiceConfig::default();
        config.discovery.extensions.clear();
        let error = validate_config(&config).expect_err("no extensions should fail");
        assert!(error.to_string().contains("at least one extension"));

        config.discovery.extensions = vec![".yaml".to_owned()];
        let error = validate_config(&config).expect_err("dotted extension should fail");
        assert!(error.to_string().contains("bare name"));
    }

    #[test]
    fn rejects_zero_marker_bytes() {
        let mut config = ServiceConfig::default();
        config.discovery.marker_bytes = 0;

        let error = validate_config(&config).expect_err("zero marker bytes should fail");
        assert!(error.to_string().contains("marker_bytes"));
    }
}
