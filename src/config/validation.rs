use crate::config::types::{
    Config, EnrichmentConfig, IdentityConfig, PacingConfig, SearchConfig, MAX_PACING_SECONDS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_identity_config(&config.identity)?;
    validate_pacing_config(&config.pacing)?;
    validate_search_config(&config.search)?;
    validate_enrichment_config(&config.enrichment)?;
    Ok(())
}

/// Validates identity pools
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents cannot contain empty entries".to_string(),
        ));
    }

    for proxy in &config.proxies {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates delay ranges and timeouts
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    let ranges = [
        ("min-delay/max-delay", config.min_delay, config.max_delay),
        (
            "search-min-delay/search-max-delay",
            config.search_min_delay,
            config.search_max_delay,
        ),
        (
            "settle-min-delay/settle-max-delay",
            config.settle_min_delay,
            config.settle_max_delay,
        ),
    ];

    for (name, min, max) in ranges {
        validate_delay_range(name, min, max)?;
    }

    validate_seconds("backoff-base", config.backoff_base)?;

    let timeouts = [
        ("page-timeout", config.page_timeout),
        ("results-timeout", config.results_timeout),
        ("probe-timeout", config.probe_timeout),
    ];

    for (name, value) in timeouts {
        validate_seconds(name, value)?;
        if value == 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a positive number of seconds, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Rejects negative, non-finite and over-long second counts
fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=MAX_PACING_SECONDS).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and {} seconds, got {}",
            name, MAX_PACING_SECONDS, value
        )));
    }
    Ok(())
}

fn validate_delay_range(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    validate_seconds(name, min)?;
    validate_seconds(name, max)?;

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} lower bound {} exceeds upper bound {}",
            name, min, max
        )));
    }

    Ok(())
}

/// Validates the search engine section
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    Url::parse(&config.engine_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid engine-url: {}", e)))?;

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "page-size must be >= 1".to_string(),
        ));
    }

    if config.results_selector.trim().is_empty() || config.link_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "results-selector and link-selector cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the enrichment endpoint
fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid enrichment endpoint: {}", e)))?;
    Ok(())
}
