// Load-time configuration schema and validation

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::policy::{self, PolicyError, RuntimePolicy, DEFAULT_TIMEOUT_SECS};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(PolicyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config: {}", e),
            Self::Parse(e) => write!(f, "failed to parse config: {}", e),
            Self::Invalid(e) => write!(f, "invalid config value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<PolicyError> for ConfigError {
    fn from(e: PolicyError) -> Self {
        Self::Invalid(e)
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Persisted plugin configuration. Storage and reloading across restarts
/// belong to the host; this type only parses and validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cleanup delay in seconds for delivered video files
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// HTTP proxy for provider and thumbnail traffic
    #[serde(default)]
    pub proxy: Option<String>,

    /// User identifiers whose requests are ignored
    #[serde(default)]
    pub banned_users: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            banned_users: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    /// Load-time validation: strictly positive timeout, http/https proxy
    /// URL, purely numeric denylist entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(PolicyError::InvalidTimeout(self.timeout.to_string()).into());
        }
        if let Some(proxy) = self.proxy.as_deref() {
            policy::validate_proxy(proxy)?;
        }
        for user in &self.banned_users {
            policy::validate_user_id(user)?;
        }
        Ok(())
    }

    /// Seed the runtime policy from the loaded configuration.
    pub fn into_policy(self) -> RuntimePolicy {
        RuntimePolicy {
            proxy: self.proxy,
            timeout_secs: self.timeout,
            denylist: self.banned_users.into_iter().collect(),
        }
    }
}
