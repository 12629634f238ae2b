use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use logdeck_logs::LogdeckConfig;

/// Load the configuration file; a missing file yields the defaults
pub fn load(path: Option<&Path>) -> Result<LogdeckConfig> {
    let Some(path) = path else {
        return Ok(LogdeckConfig::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(LogdeckConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config =
        parse(&text).with_context(|| format!("Invalid config file {}", path.display()))?;

    info!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn parse(text: &str) -> Result<LogdeckConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdeck_types::PageSize;
    use std::time::Duration;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.reader.default_log_levels, None);
        assert_eq!(config.tail.refresh_delay(), Duration::from_millis(500));
        assert_eq!(config.tail.retry_policy().max_attempts(), 3);
        assert_eq!(config.storage.default_date_filter, "THIS_WEEK");
        assert_eq!(config.storage.refresh_interval(), None);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = parse(
            r#"
            [reader]
            default_log_levels = "info, WARN"
            default_logs_per_page = 50

            [tail]
            retry_attempts = 5

            [storage]
            refresh_interval_secs = 60
            chart_type = "line"
            "#,
        )
        .unwrap();

        assert_eq!(config.reader.default_log_levels.as_deref(), Some("info, WARN"));
        assert_eq!(
            PageSize::from_configured(config.reader.default_logs_per_page),
            PageSize::Fifty
        );
        assert_eq!(config.tail.retry_attempts, 5);
        assert_eq!(config.tail.retry_backoff_ms, 1000);
        assert_eq!(config.storage.refresh_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.storage.chart_type, "line");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(parse("[tail]\nretry_attempts = \"three\"").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load(Some(Path::new("/nonexistent/logdeck.toml"))).unwrap();
        assert_eq!(config.storage.chart_type, "bar");
    }
}
