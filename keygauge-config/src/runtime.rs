//! Validation of the configuration into runtime settings.
//!
//! Nothing downstream reads the file or the environment; everything the
//! collector needs is resolved here, once.

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use keygauge_core::{Credential, ProviderKind};
use keygauge_fetch::{Credentials, FetchSettings, ProviderSettings, RetryPolicy};
use tracing::debug;

use crate::config::{Backoff, Config, CredentialValue, ProviderConfig, RetryConfig};
use crate::error::ConfigError;

/// Prefix of every credential in the generated template.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

// ============================================================================
// Runtime Config
// ============================================================================

/// Where and under which job metrics are pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
    /// Push after every cycle unless overridden on the command line.
    pub enabled: bool,
    /// Gateway base URL.
    pub url: String,
    /// Job name.
    pub job: String,
}

/// The validated, read-only configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Settings shared by every request.
    pub fetch: FetchSettings,
    /// Enabled providers, in provider order.
    pub providers: Vec<ProviderSettings>,
    /// Push target.
    pub push: PushSettings,
    /// Interval between cycles in watch mode.
    pub watch_interval: Duration,
    /// Default log filter.
    pub log_level: String,
}

impl Config {
    /// Validates the configuration, reading credentials from the process
    /// environment where configured.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn into_runtime(self) -> Result<RuntimeConfig, ConfigError> {
        self.into_runtime_with(|var| std::env::var(var).ok())
    }

    /// Validates the configuration with a custom environment lookup.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn into_runtime_with(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<RuntimeConfig, ConfigError> {
        let general = self.general;
        if general.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        if general.watch_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "watch_interval_secs must be at least 1".into(),
            ));
        }

        let mut fetch =
            FetchSettings::default().with_timeout(Duration::from_secs(general.timeout_secs));
        for (host, ip) in general.dns_overrides {
            let ip = IpAddr::from_str(&ip).map_err(|_| {
                ConfigError::Invalid(format!("dns_overrides.{host}: `{ip}` is not an IP address"))
            })?;
            fetch = fetch.with_dns_override(host, ip);
        }

        let mut providers = Vec::new();
        for (id, config) in self.providers {
            let kind = ProviderKind::from_str(&id).map_err(|_| ConfigError::UnknownProvider(id))?;
            if !config.enabled {
                debug!(provider = %kind, "Provider disabled");
                continue;
            }
            providers.push(provider_settings(kind, config, &env)?);
        }
        providers.sort_by_key(|p| p.kind);
        if let Some(pair) = providers.windows(2).find(|w| w[0].kind == w[1].kind) {
            return Err(ConfigError::Invalid(format!(
                "{} is configured more than once",
                pair[0].kind
            )));
        }

        let job = &general.push_gateway.job;
        if job.is_empty() || job.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "push_gateway.job: `{job}` must be non-empty and contain no `/`"
            )));
        }
        let push = PushSettings {
            enabled: general.push_gateway.enabled,
            url: general.push_gateway.url.trim_end_matches('/').to_string(),
            job: general.push_gateway.job,
        };

        Ok(RuntimeConfig {
            fetch,
            providers,
            push,
            watch_interval: Duration::from_secs(general.watch_interval_secs),
            log_level: general.log_level,
        })
    }
}

// ============================================================================
// Provider Settings
// ============================================================================

fn provider_settings(
    kind: ProviderKind,
    config: ProviderConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ProviderSettings, ConfigError> {
    let credentials = match (config.credentials, config.credentials_env) {
        (Some(CredentialValue::One(raw)), _) => Credentials::One(credential(kind, raw)?),
        (Some(CredentialValue::Many(list)), _) => Credentials::Many(
            list.into_iter()
                .map(|raw| credential(kind, raw))
                .collect::<Result<_, _>>()?,
        ),
        (None, Some(var)) => credentials_from_env(kind, &var, env)?,
        (None, None) => return Err(ConfigError::NoCredentials(kind)),
    };

    let admin_credential = match (config.admin_credential, config.admin_credential_env) {
        (Some(raw), _) => Some(credential(kind, raw)?),
        (None, Some(var)) => {
            let raw = env(&var).ok_or(ConfigError::MissingEnv { provider: kind, var })?;
            Some(credential(kind, raw.trim().to_string())?)
        }
        (None, None) => None,
    };

    let mut settings = ProviderSettings::new(kind, credentials)
        .with_retry(retry_policy(kind, &config.retry)?);
    settings.admin_credential = admin_credential;
    settings.base_url = config.base_url;
    settings.limit_bands = config.limit_bands;
    settings.request_pause = config.request_pause_ms.map(Duration::from_millis);

    debug!(
        provider = %kind,
        keys = settings.credentials.len(),
        attempts = settings.retry.max_attempts,
        "Provider enabled"
    );
    Ok(settings)
}

fn credential(kind: ProviderKind, raw: String) -> Result<Credential, ConfigError> {
    let credential = Credential::new(raw);
    if credential.is_blank() {
        return Err(ConfigError::Invalid(format!("{kind} has a blank credential")));
    }
    if credential.expose().starts_with(PLACEHOLDER_PREFIX) {
        return Err(ConfigError::Placeholder(kind));
    }
    Ok(credential)
}

/// Reads `var`; a comma-separated value is a list, anything else one key.
fn credentials_from_env(
    kind: ProviderKind,
    var: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ConfigError> {
    let raw = env(var).ok_or_else(|| ConfigError::MissingEnv {
        provider: kind,
        var: var.to_string(),
    })?;

    if raw.contains(',') {
        let list = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| credential(kind, part.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Credentials::Many(list))
    } else {
        Ok(Credentials::One(credential(kind, raw.trim().to_string())?))
    }
}

fn retry_policy(kind: ProviderKind, config: &RetryConfig) -> Result<RetryPolicy, ConfigError> {
    if config.attempts == 0 {
        return Err(ConfigError::Invalid(format!(
            "{kind}: retry.attempts must be at least 1"
        )));
    }

    let mut policy = RetryPolicy::new(config.attempts)
        .with_base_delay(config.delay_secs)
        .with_exponential_backoff(config.backoff == Backoff::Exponential);
    if let Some(secs) = config.attempt_timeout_secs {
        policy = policy.with_attempt_timeout(Duration::from_secs(secs));
    }
    Ok(policy)
}

// ============================================================================
// Tests
// ============================================================================
