//! Configuration file model.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use keygauge_core::{LimitBands, ProviderKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "KEYGAUGE_CONFIG";

// ============================================================================
// Config
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Provider-specific configurations, keyed by provider id.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Hostnames pinned to fixed IP addresses.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dns_overrides: BTreeMap<String, String>,
    /// Push gateway settings.
    #[serde(default)]
    pub push_gateway: PushGatewayConfig,
    /// Seconds between cycles in watch mode.
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,
}

/// Push gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushGatewayConfig {
    /// Whether cycles push their metrics.
    #[serde(default)]
    pub enabled: bool,
    /// Gateway base URL.
    #[serde(default = "default_push_url")]
    pub url: String,
    /// Job name the metrics are grouped under.
    #[serde(default = "default_push_job")]
    pub job: String,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider is collected.
    #[serde(default)]
    pub enabled: bool,
    /// Inline credential or credential list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialValue>,
    /// Environment variable holding credentials, comma-separated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_env: Option<String>,
    /// Inline organization-level credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_credential: Option<String>,
    /// Environment variable holding the organization-level credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_credential_env: Option<String>,
    /// Retry policy for each credential.
    #[serde(default)]
    pub retry: RetryConfig,
    /// API base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Heuristic limit band override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_bands: Option<LimitBands>,
    /// Pause between sequential calls, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_pause_ms: Option<u64>,
}

/// A single credential or a list of them.
///
/// A single string is fetched directly; a list yields one metric per entry,
/// even when it has one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialValue {
    /// One credential.
    One(String),
    /// A list of credentials.
    Many(Vec<String>),
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per credential, at least 1.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay before the second attempt, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// How the delay grows between attempts.
    #[serde(default)]
    pub backoff: Backoff,
    /// Bound on one attempt, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_secs: Option<u64>,
}

/// Delay growth between retry attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Delay doubles after each attempt.
    Exponential,
}

// ============================================================================
// Defaults
// ============================================================================

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_watch_interval_secs() -> u64 {
    300
}

fn default_push_url() -> String {
    "http://localhost:9091".to_string()
}

fn default_push_job() -> String {
    "cron-apikey-usage".to_string()
}

fn default_attempts() -> u32 {
    3
}

fn default_delay_secs() -> u64 {
    120
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            log_level: default_log_level(),
            dns_overrides: BTreeMap::new(),
            push_gateway: PushGatewayConfig::default(),
            watch_interval_secs: default_watch_interval_secs(),
        }
    }
}

impl Default for PushGatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_push_url(),
            job: default_push_job(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay_secs(),
            backoff: Backoff::Fixed,
            attempt_timeout_secs: None,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Serialization format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keygauge")
            .join("config.json")
    }

    /// Picks the explicit path, else `KEYGAUGE_CONFIG`, else the default.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        Self::resolve_path_with(explicit, std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    fn resolve_path_with(explicit: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or(from_env.filter(|p| !p.as_os_str().is_empty()))
            .unwrap_or_else(Self::default_path)
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config = Self::parse(&content, Format::of(path))?;

        info!(path = %path.display(), providers = config.providers.len(), "Loaded configuration");
        Ok(config)
    }

    fn parse(content: &str, format: Format) -> Result<Self, ConfigError> {
        match format {
            Format::Json => Ok(serde_json::from_str(content)?),
            Format::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }

    /// Saves configuration to a specific path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let content = match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        };
        std::fs::write(path, content).map_err(|e| ConfigError::io(path, e))?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// A starter configuration listing every provider, all disabled.
    pub fn template() -> Self {
        let providers = ProviderKind::all()
            .iter()
            .map(|kind| {
                let credentials = match kind {
                    ProviderKind::Birdeye => CredentialValue::One("YOUR_EMAIL:YOUR_PASSWORD".into()),
                    ProviderKind::QuickNode | ProviderKind::OpenAi => {
                        CredentialValue::Many(vec!["YOUR_API_KEY".into()])
                    }
                    _ => CredentialValue::One("YOUR_API_KEY".into()),
                };
                let admin_credential =
                    (*kind == ProviderKind::OpenAi).then(|| "YOUR_ADMIN_API_KEY".to_string());
                let config = ProviderConfig {
                    credentials: Some(credentials),
                    admin_credential,
                    ..ProviderConfig::default()
                };
                (kind.id().to_string(), config)
            })
            .collect();

        Self {
            general: GeneralConfig::default(),
            providers,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.general.timeout_secs, 30);
        assert_eq!(config.general.push_gateway.job, "cron-apikey-usage");
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "general": {"timeout_secs": 10, "dns_overrides": {"multichain-api.birdeye.so": "37.59.30.17"}},
                "providers": {
                    "coingecko": {"enabled": true, "credentials": "CG-0123456789abcdef"},
                    "quicknode": {"enabled": true, "credentials": ["qn-1", "qn-2"],
                                  "retry": {"attempts": 5, "backoff": "exponential"}}
                }
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.general.timeout_secs, 10);
        assert_eq!(config.general.watch_interval_secs, 300);
        assert_eq!(
            config.providers["coingecko"].credentials,
            Some(CredentialValue::One("CG-0123456789abcdef".into()))
        );
        let quicknode = &config.providers["quicknode"];
        assert_eq!(quicknode.retry.attempts, 5);
        assert_eq!(quicknode.retry.delay_secs, 120);
        assert_eq!(quicknode.retry.backoff, Backoff::Exponential);
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "providers:\n  coinmarketcap:\n    enabled: true\n    credentials_env: CMC_SESSION\n    limit_bands:\n      - threshold: 0\n        limit: 5000\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let cmc = &config.providers["coinmarketcap"];

        assert_eq!(cmc.credentials_env.as_deref(), Some("CMC_SESSION"));
        assert_eq!(cmc.limit_bands.as_ref().unwrap().estimate(100), 5000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_empty_band_table_rejected() {
        let json = r#"{"providers": {"coinmarketcap": {"limit_bands": []}}}"#;
        assert!(Config::parse(json, Format::Json).is_err());
    }

    #[test]
    fn test_template_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yml");

        Config::template().save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, Config::template());
        assert_eq!(loaded.providers.len(), ProviderKind::all().len());
        assert!(loaded.providers.values().all(|p| !p.enabled));
    }

    #[test]
    fn test_resolve_path_precedence() {
        let explicit = PathBuf::from("/etc/keygauge.yaml");
        let from_env = PathBuf::from("/tmp/env.json");

        assert_eq!(
            Config::resolve_path_with(Some(&explicit), Some(from_env.clone())),
            explicit
        );
        assert_eq!(Config::resolve_path_with(None, Some(from_env.clone())), from_env);
        assert_eq!(Config::resolve_path_with(None, None), Config::default_path());
    }
}
