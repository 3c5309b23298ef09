use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Cache behavior (TTL, search radius)
    #[serde(default)]
    pub cache: CacheSettings,

    /// Upstream weather provider
    #[serde(default)]
    pub upstream: UpstreamSettings,
}

/// Cache tuning. Rate limits and location density vary by deployment,
/// so both knobs are configuration rather than constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long a cached reading stays valid, in minutes
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,

    /// How far from the query point a cached reading may be reused, in kilometers
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

fn default_ttl_minutes() -> u64 {
    5
}

fn default_radius_km() -> f64 {
    1.0
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            radius_km: default_radius_km(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the current-weather endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Provider API key (can be set via the NIMBUS_API_KEY environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: std::env::var("NIMBUS_API_KEY").ok(), // Read from environment
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamSettings {
    /// Check if an API key is configured (not a placeholder)
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty() && !k.starts_with("YOUR_"))
    }

    /// Effective API key: the environment variable wins over the config file.
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var("NIMBUS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nimbus");

        Self {
            config_dir,
            cache: CacheSettings::default(),
            upstream: UpstreamSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating default if it doesn't exist
    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the config file inside the platform config directory
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("nimbus");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.cache.ttl_minutes == 0 {
            result.add_error("cache.ttl_minutes", "TTL must be at least one minute");
        }

        if !self.cache.radius_km.is_finite() || self.cache.radius_km <= 0.0 {
            result.add_error(
                "cache.radius_km",
                "search radius must be a positive number of kilometers",
            );
        }

        if self.upstream.timeout_secs == 0 {
            result.add_error("upstream.timeout_secs", "timeout must be at least one second");
        }

        match Url::parse(&self.upstream.api_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                result.add_error(
                    "upstream.api_url",
                    format!("unsupported URL scheme '{}'", url.scheme()),
                );
            }
            Err(e) => {
                result.add_error("upstream.api_url", format!("invalid URL: {}", e));
            }
        }

        if !self.upstream.is_configured() {
            result.add_warning(
                "upstream.api_key",
                "no API key configured; upstream requests will be rejected",
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_default_cache_settings() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_minutes, 5);
        assert!((config.cache.radius_km - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_upstream_settings() {
        let upstream = UpstreamSettings::default();
        assert!(upstream.api_url.contains("openweathermap"));
        assert_eq!(upstream.timeout_secs, 10);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            config_dir = "/tmp/nimbus"

            [cache]
            radius_km = 2.5
            "#,
        )
        .unwrap();

        assert!((config.cache.radius_km - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.cache.ttl_minutes, 5);
        assert_eq!(config.upstream.timeout_secs, 10);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.cache.ttl_minutes = 10;
        config.upstream.api_key = Some("abc123".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(restored.cache.ttl_minutes, 10);
        assert_eq!(restored.upstream.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.cache.ttl_minutes, 5);

        // A second load reads the file back rather than rewriting it
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.cache.ttl_minutes, 5);
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        let mut config = Config::default();
        config.cache.radius_km = -1.0;

        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.error_summary().contains("cache.radius_km"));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_minutes = 0;

        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.upstream.api_url = "not a url".to_string();

        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.error_summary().contains("upstream.api_url"));
    }

    #[test]
    fn test_missing_api_key_is_warning_not_error() {
        let mut config = Config::default();
        config.upstream.api_key = None;

        // Only meaningful when the environment doesn't provide a key
        if std::env::var("NIMBUS_API_KEY").is_err() {
            let result = config.validate();
            assert!(result.is_valid());
            assert!(!result.warnings.is_empty());
        }
    }

    #[test]
    fn test_is_configured_rejects_placeholder() {
        let upstream = UpstreamSettings {
            api_key: Some("YOUR_API_KEY".to_string()),
            ..UpstreamSettings::default()
        };
        assert!(!upstream.is_configured());
    }
}
