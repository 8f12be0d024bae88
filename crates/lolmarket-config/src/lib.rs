//! Configuration management.

mod settings;

pub use settings::{
    ApiSettings, AppConfig, AppSettings, CacheSettings, LoggingConfig, SessionSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Prefix of environment overrides, e.g. `LOLMARKET__API__BASE_URL`.
pub const ENV_PREFIX: &str = "LOLMARKET";

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    build(path, true)
}

/// Like [`load_config`], but a missing file falls back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    build(path, false)
}

fn build(path: &Path, required: bool) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

/// Default configuration as TOML, for writing a starter config file.
pub fn default_config_toml() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&AppConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://markets.example.com"
timeout_secs = 5

[cache]
stale_after_secs = 30
poll_interval_secs = 60
refresh_delay_ms = 2000

[session]
user_id = "user-a"
prefs_path = "/tmp/prefs.toml"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api.base_url, "https://markets.example.com");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.cache.stale_after(), Some(Duration::from_secs(30)));
        assert_eq!(config.cache.poll_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.session.user_id.as_deref(), Some("user-a"));
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.app, AppSettings::default());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(&path).is_err());

        let config = load_config_or_default(&path).unwrap();
        assert_eq!(config.cache.refresh_delay(), Duration::from_millis(2000));
        assert_eq!(config.cache.stale_after(), None);
    }

    #[test]
    fn test_default_config_round_trips_through_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, default_config_toml().unwrap()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.api, ApiSettings::default());
        assert_eq!(config.cache, CacheSettings::default());
    }

    #[test]
    fn test_zero_poll_interval_disables_polling() {
        let cache = CacheSettings {
            poll_interval_secs: Some(0),
            ..CacheSettings::default()
        };
        assert_eq!(cache.poll_interval(), None);
    }

    #[test]
    fn test_json_logging_flag() {
        let logging = LoggingConfig {
            format: "JSON".to_string(),
            ..LoggingConfig::default()
        };
        assert!(logging.is_json());
        assert!(!LoggingConfig::default().is_json());
    }
}
