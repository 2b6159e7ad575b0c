//! Configuration module for settlement-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub cache: CacheConfig,
    pub refunds: RefundPolicy,
    /// JSON file of purchase snapshots loaded into the in-memory store.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub status_ttl: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RefundPolicy {
    /// Complete a refund even when payments cover only part of it.
    pub allow_partial: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            status_ttl: Duration::from_secs(30),
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            service_name: "settlement-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            cache: CacheConfig::default(),
            refunds: RefundPolicy::default(),
            seed_file: None,
        }
    }
}

impl SettlementConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "settlement-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            cache: CacheConfig {
                status_ttl: Duration::from_secs(parse_env("STATUS_CACHE_TTL_SECS", 30)?),
            },
            refunds: RefundPolicy {
                allow_partial: parse_env("REFUND_ALLOW_PARTIAL", false)?,
            },
            seed_file: env::var("SEED_FILE").ok().map(PathBuf::from),
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value {:?}: {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}
