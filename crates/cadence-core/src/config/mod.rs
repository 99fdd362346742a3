//! Configuration system for cadence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CadenceError, CadenceResult};

/// Default scheduling service address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the scheduling service.
    pub base_url: String,
    /// Per-request timeout in seconds. None waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// Scores strictly above this count as mastered.
    pub mastery_threshold: f64,
    /// Refill the recommendation cache once it holds this many entries or fewer.
    pub refill_low_water: usize,
    /// Ignore out-of-order schedule responses for the same topic.
    pub discard_stale_responses: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            mastery_threshold: 0.7,
            refill_low_water: 2,
            discard_stale_responses: false,
        }
    }
}

impl DashboardConfig {
    /// Conventional location: `~/.cadence/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".cadence"))
            .unwrap_or_else(|| PathBuf::from(".cadence"))
            .join("config.toml")
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> CadenceResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| CadenceError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| CadenceError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| CadenceError::Configuration(e.to_string()))?,
            _ => {
                return Err(CadenceError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> CadenceResult<Self> {
        Self::default().apply_env()
    }

    /// Override fields from `CADENCE_*` environment variables.
    pub fn apply_env(self) -> CadenceResult<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> CadenceResult<Self> {
        if let Some(url) = var("CADENCE_BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = var("CADENCE_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(parse_var("CADENCE_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = var("CADENCE_MASTERY_THRESHOLD") {
            self.mastery_threshold = parse_var("CADENCE_MASTERY_THRESHOLD", &raw)?;
        }
        if let Some(raw) = var("CADENCE_REFILL_LOW_WATER") {
            self.refill_low_water = parse_var("CADENCE_REFILL_LOW_WATER", &raw)?;
        }
        if let Some(raw) = var("CADENCE_DISCARD_STALE") {
            self.discard_stale_responses = parse_flag(&raw).ok_or_else(|| {
                CadenceError::Configuration(format!("CADENCE_DISCARD_STALE: not a boolean: {}", raw))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the dashboard cannot work with.
    pub fn validate(&self) -> CadenceResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(CadenceError::Configuration("base_url must not be empty".to_string()));
        }
        if !self.mastery_threshold.is_finite() || !(0.0..=1.0).contains(&self.mastery_threshold) {
            return Err(CadenceError::Configuration(format!(
                "mastery_threshold must be within [0, 1], got {}",
                self.mastery_threshold
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(CadenceError::Configuration(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> CadenceResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| CadenceError::Configuration(format!("{}: {}", key, e)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builder for DashboardConfig.
#[derive(Default)]
pub struct DashboardConfigBuilder {
    config: DashboardConfig,
}

impl DashboardConfigBuilder {
    /// Set the service base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Set the mastery threshold.
    pub fn mastery_threshold(mut self, threshold: f64) -> Self {
        self.config.mastery_threshold = threshold;
        self
    }

    /// Set the cache refill low-water mark.
    pub fn refill_low_water(mut self, count: usize) -> Self {
        self.config.refill_low_water = count;
        self
    }

    /// Enable or disable stale-response discarding.
    pub fn discard_stale_responses(mut self, enabled: bool) -> Self {
        self.config.discard_stale_responses = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CadenceResult<DashboardConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.mastery_threshold, 0.7);
        assert_eq!(config.refill_low_water, 2);
        assert!(!config.discard_stale_responses);
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = DashboardConfig::default_path();
        assert!(path.ends_with(".cadence/config.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let config = DashboardConfig::default()
            .apply_vars(vars(&[
                ("CADENCE_BASE_URL", "http://tracker.local:8000"),
                ("CADENCE_TIMEOUT_SECS", "15"),
                ("CADENCE_MASTERY_THRESHOLD", "0.8"),
                ("CADENCE_REFILL_LOW_WATER", "4"),
                ("CADENCE_DISCARD_STALE", "yes"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "http://tracker.local:8000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.mastery_threshold, 0.8);
        assert_eq!(config.refill_low_water, 4);
        assert!(config.discard_stale_responses);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = DashboardConfig::default()
            .apply_vars(vars(&[("CADENCE_REFILL_LOW_WATER", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("CADENCE_REFILL_LOW_WATER"));

        let err = DashboardConfig::default()
            .apply_vars(vars(&[("CADENCE_DISCARD_STALE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, CadenceError::Configuration(_)));
    }

    #[test]
    fn test_validate_threshold_range() {
        let config = DashboardConfig {
            mastery_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(DashboardConfig::builder().mastery_threshold(f64::NAN).build().is_err());
        assert!(DashboardConfig::builder().request_timeout_secs(0).build().is_err());
    }

    #[test]
    fn test_from_toml_file_keeps_unset_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "base_url = \"http://127.0.0.1:9000\"").unwrap();
        writeln!(file, "mastery_threshold = 0.75").unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.mastery_threshold, 0.75);
        assert_eq!(config.refill_low_water, 2);
    }

    #[test]
    fn test_from_yaml_and_json_files() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "refill_low_water: 5\ndiscard_stale_responses: true").unwrap();
        let config = DashboardConfig::from_file(yaml.path()).unwrap();
        assert_eq!(config.refill_low_water, 5);
        assert!(config.discard_stale_responses);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"request_timeout_secs": 30}}"#).unwrap();
        let config = DashboardConfig::from_file(json.path()).unwrap();
        assert_eq!(config.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_builder() {
        let config = DashboardConfig::builder()
            .base_url("http://example.test")
            .refill_low_water(0)
            .discard_stale_responses(true)
            .build()
            .unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.refill_low_water, 0);
        assert!(config.discard_stale_responses);
    }
}
