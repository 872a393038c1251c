//! Server configuration: YAML file, then environment, then CLI flags.

use crate::api::http::{ClientOptions, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "DIGITALOCEAN_API_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "DIGITALOCEAN_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Token used when a request carries no bearer token of its own.
    pub api_token: Option<String>,
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub http_port: u16,
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            user_agent: format!("{}/{}", crate::SERVER_NAME, crate::SERVER_VERSION),
            http_port: 8080,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reads `path`, or the default config file when it exists, then
    /// applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = default_config_path();
                if default.is_file() {
                    log::debug!("Loading config from {}", default.display());
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overrides token and URL from the given variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("https://") || self.api_url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// `~/.droplet-mcp`, holding the config file and stdio-mode logs.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".droplet-mcp")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
