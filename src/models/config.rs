use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::models::cache::DEFAULT_CACHE_TTL;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const LOCAL_API_URL: &str = "http://localhost:8080";
const PRODUCTION_API_URL: &str = "https://mdcanbdm042-2025-tdlv8.ondigitalocean.app";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Environment::Development | Environment::Test => LOCAL_API_URL,
            Environment::Production => PRODUCTION_API_URL,
        }
    }

    pub fn is_debug(&self) -> bool {
        !matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

/// Settings for a [`crate::RequestGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub base_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub debug: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl GatewayConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            base_url: environment.default_base_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            debug: environment.is_debug(),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// `CONFERENCE_ENV` picks the environment, `CONFERENCE_API_URL`,
    /// `CONFERENCE_API_TIMEOUT_SECS` and `CONFERENCE_CACHE_TTL_SECS` override
    /// individual settings. Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("CONFERENCE_ENV")
            .and_then(|s| s.parse::<Environment>().ok())
            .unwrap_or_default();
        let mut config = Self::for_environment(environment);

        if let Some(url) = lookup("CONFERENCE_API_URL").filter(|s| !s.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("CONFERENCE_API_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("CONFERENCE_CACHE_TTL_SECS").and_then(|s| s.parse::<u64>().ok()) {
            config.cache_ttl = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}
