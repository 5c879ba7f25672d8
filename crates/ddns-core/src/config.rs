//! Configuration types for the DDNS updater
//!
//! The whole configuration is read once at startup from environment-style
//! key/value pairs and then handed to the resolver, the provider and the
//! engine by value. Nothing here is global.
//!
//! Required keys are collected in one pass so a misconfigured deployment is
//! told about every missing key at once. Optional keys with unusable values
//! fall back to their defaults and produce a [`ConfigWarning`] that the
//! daemon logs after the subscriber is installed.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::error::{Error, Result};

/// Default IP-echo endpoint
pub const DEFAULT_IP_URL: &str = "https://checkip.amazonaws.com";

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default minutes between cycles
pub const DEFAULT_INTERVAL_MINS: u64 = 5;

/// Default record TTL; `1` is Cloudflare's "automatic"
pub const DEFAULT_TTL: u32 = 1;

/// Default timeout for every outbound HTTP request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Environment variable names
pub mod keys {
    pub const ZONE: &str = "CLOUDFLARE_ZONE";
    pub const RECORD: &str = "CLOUDFLARE_RECORD";
    pub const TOKEN: &str = "CLOUDFLARE_TOKEN";
    pub const IP_URL: &str = "IP_URL";
    pub const INTERVAL_MINS: &str = "INTERVAL_MINS";
    pub const TTL: &str = "CLOUDFLARE_DNS_TTL";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
    pub const IP_FILE: &str = "IP_FILE";
    pub const DRY_RUN: &str = "DRY_RUN";
    pub const API_URL: &str = "CLOUDFLARE_API_URL";
}

/// A non-fatal configuration problem, reported after logging starts
pub type ConfigWarning = String;

/// Main DDNS configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// IP-echo configuration
    pub ip_source: IpSourceConfig,

    /// Scheduler settings
    pub engine: EngineConfig,

    /// Maximum log level for the daemon's subscriber
    pub log_level: Level,
}

impl DdnsConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<(Self, Vec<ConfigWarning>)> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value lookup
    ///
    /// Values are trimmed; a key set to an empty string counts as unset.
    pub fn from_vars<F>(lookup: F) -> Result<(Self, Vec<ConfigWarning>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            let value = get(key);
            if value.is_none() {
                missing.push(key.to_string());
            }
            value.unwrap_or_default()
        };

        let zone = require(keys::ZONE);
        let record = require(keys::RECORD);
        let api_token = require(keys::TOKEN);

        if !missing.is_empty() {
            return Err(Error::MissingConfig(missing));
        }

        let mut warnings = Vec::new();

        let ip_url = get(keys::IP_URL).unwrap_or_else(|| DEFAULT_IP_URL.to_string());
        validate_url(keys::IP_URL, &ip_url)?;

        let api_base = get(keys::API_URL)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        validate_url(keys::API_URL, &api_base)?;

        let interval_mins = parse_or_default(
            get(keys::INTERVAL_MINS),
            keys::INTERVAL_MINS,
            DEFAULT_INTERVAL_MINS,
            |mins: &u64| *mins > 0 && mins.checked_mul(60).is_some(),
            &mut warnings,
        );

        let ttl = parse_or_default(
            get(keys::TTL),
            keys::TTL,
            DEFAULT_TTL,
            |_: &u32| true,
            &mut warnings,
        );

        let timeout_secs = parse_or_default(
            get(keys::HTTP_TIMEOUT_SECS),
            keys::HTTP_TIMEOUT_SECS,
            DEFAULT_HTTP_TIMEOUT_SECS,
            |secs: &u64| *secs > 0,
            &mut warnings,
        );
        let timeout = Duration::from_secs(timeout_secs);

        let log_level = match get(keys::LOG_LEVEL) {
            None => Level::INFO,
            Some(level) => parse_log_level(&level).unwrap_or_else(|| {
                warnings.push(format!(
                    "Invalid {} '{}'. Defaulting to 'info'",
                    keys::LOG_LEVEL,
                    level
                ));
                Level::INFO
            }),
        };

        let dry_run = get(keys::DRY_RUN)
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            provider: ProviderConfig {
                zone,
                record,
                api_token,
                ttl,
                api_base,
                dry_run,
                timeout,
            },
            ip_source: IpSourceConfig {
                url: ip_url,
                timeout,
            },
            engine: EngineConfig {
                interval: Duration::from_secs(interval_mins * 60),
                state_file: get(keys::IP_FILE).map(PathBuf::from),
                event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            },
            log_level,
        };

        Ok((config, warnings))
    }

}

/// Cloudflare provider configuration
#[derive(Clone)]
pub struct ProviderConfig {
    /// Zone name, e.g. "example.com"
    pub zone: String,

    /// A record name, e.g. "home.example.com"
    pub record: String,

    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// TTL for the record in seconds (`1` = automatic)
    pub ttl: u32,

    /// API base URL without trailing slash
    pub api_base: String,

    /// Perform lookups but skip create/update
    pub dry_run: bool,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Minimal provider configuration with defaults for everything optional
    pub fn new(
        zone: impl Into<String>,
        record: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            record: record.into(),
            api_token: api_token.into(),
            ttl: DEFAULT_TTL,
            api_base: DEFAULT_API_BASE.to_string(),
            dry_run: false,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Point the provider at a different API base
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the record TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("zone", &self.zone)
            .field("record", &self.record)
            .field("api_token", &"<REDACTED>")
            .field("ttl", &self.ttl)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// IP-echo configuration
#[derive(Debug, Clone)]
pub struct IpSourceConfig {
    /// URL returning the caller's public IP as plain text
    pub url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_IP_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between the end of one cycle and the start of the next
    pub interval: Duration,

    /// Optional file mirroring the last applied address
    pub state_file: Option<PathBuf>,

    /// Capacity of the engine event channel
    ///
    /// When full, events are dropped with a warning.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_MINS * 60),
            state_file: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            key, url
        )));
    }
    Ok(())
}

fn parse_or_default<T>(
    raw: Option<String>,
    key: &str,
    default: T,
    accept: impl Fn(&T) -> bool,
    warnings: &mut Vec<ConfigWarning>,
) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.parse::<T>() {
        Ok(value) if accept(&value) => value,
        _ => {
            warnings.push(format!(
                "Invalid {} '{}'. Defaulting to '{}'",
                key, raw, default
            ));
            default
        }
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
