use crate::config::types::{CategoryEntry, Config, CrawlConfig, OutputConfig};
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.category)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 1000, got {}",
            config.max_concurrency
        )));
    }

    if config.window < 1 {
        return Err(ConfigError::Validation(format!(
            "window must be >= 1, got {}",
            config.window
        )));
    }

    // The window bounds logical operations, the concurrency limit bounds the
    // network. A window wider than the network limit just queues on admission.
    if config.window > config.max_concurrency {
        tracing::warn!(
            "window ({}) exceeds max_concurrency ({}); extra operations will wait on admission",
            config.window,
            config.max_concurrency
        );
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates category entries
///
/// Category names become directory and file names, so they are restricted to
/// alphanumeric characters, hyphens and underscores, and must be unique.
fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in categories {
        if entry.name.is_empty() {
            return Err(ConfigError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }

        if !entry
            .name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "category name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
                entry.name
            )));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name '{}'",
                entry.name
            )));
        }
    }

    Ok(())
}
