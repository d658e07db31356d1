//! Process configuration read from the environment.
//!
//! Every setting is looked up under its `HASHWATT_` name first and then
//! under the plain name.

use std::env;
use std::time::Duration;

use crate::cache::{DEFAULT_FRESH_TTL, DEFAULT_STALE_TTL};
use crate::error::ValidationError;
use crate::retry::RetryConfig;

const LUXOR_API_KEY: (&str, &str) = ("HASHWATT_LUXOR_API_KEY", "LUXOR_API_KEY");
const CACHE_TTL_SECS: (&str, &str) = ("HASHWATT_CACHE_TTL_SECS", "CACHE_TTL_SECS");
const CACHE_STALE_TTL_SECS: (&str, &str) =
    ("HASHWATT_CACHE_STALE_TTL_SECS", "CACHE_STALE_TTL_SECS");

#[derive(Debug, Clone, PartialEq)]
pub struct HashwattConfig {
    /// Premium source credential; `None` leaves the premium source disabled.
    pub luxor_api_key: Option<String>,
    pub fresh_ttl: Duration,
    pub stale_ttl: Duration,
    pub retry: RetryConfig,
}

impl Default for HashwattConfig {
    fn default() -> Self {
        Self {
            luxor_api_key: None,
            fresh_ttl: DEFAULT_FRESH_TTL,
            stale_ttl: DEFAULT_STALE_TTL,
            retry: RetryConfig::default(),
        }
    }
}

impl HashwattConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            luxor_api_key: non_blank(resolve(&lookup, LUXOR_API_KEY)),
            fresh_ttl: seconds(&lookup, CACHE_TTL_SECS)?.unwrap_or(defaults.fresh_ttl),
            stale_ttl: seconds(&lookup, CACHE_STALE_TTL_SECS)?.unwrap_or(defaults.stale_ttl),
            retry: defaults.retry,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_luxor_key(mut self, key: impl Into<String>) -> Self {
        self.luxor_api_key = non_blank(Some(key.into()));
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fresh_ttl.is_zero() {
            return Err(ValidationError::ZeroFreshTtl);
        }
        if self.stale_ttl <= self.fresh_ttl {
            return Err(ValidationError::StaleTtlNotAfterFresh {
                fresh_secs: self.fresh_ttl.as_secs(),
                stale_secs: self.stale_ttl.as_secs(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::ZeroAttempts);
        }
        Ok(())
    }

    pub fn luxor_configured(&self) -> bool {
        self.luxor_api_key.is_some()
    }
}

fn resolve<F>(lookup: &F, (prefixed, plain): (&str, &str)) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(prefixed).or_else(|| lookup(plain))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn seconds<F>(
    lookup: &F,
    names: (&'static str, &'static str),
) -> Result<Option<Duration>, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = resolve(lookup, names) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| ValidationError::InvalidSeconds {
            name: names.0,
            value: raw,
        })
}
