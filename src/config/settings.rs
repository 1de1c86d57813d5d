use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GatewayError, Result};

pub const DEFAULT_ACCESS_KEY: &str = "az-intital-key";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8006,
        }
    }
}

/// Groq (OpenAI-compatible) endpoint and credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub connect_timeout_secs: u64,
    /// Ignore HTTP(S)_PROXY for upstream calls.
    pub bypass_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            connect_timeout_secs: 10,
            bypass_proxy: false,
        }
    }
}

/// Static shared secret callers present as `Authorization: Bearer <key>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub key: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_ACCESS_KEY.to_string(),
        }
    }
}

impl Settings {
    /// File (if any) → environment → validation.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| GatewayError::Config(format!("invalid PORT value: {}", port)))?;
        }
        if let Some(key) = get("GROQ_API_KEY") {
            self.upstream.api_key = key;
        }
        if let Some(url) = get("GROQ_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(key) = get("RELAY_ACCESS_KEY") {
            self.access.key = key;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.api_key.trim().is_empty() {
            return Err(GatewayError::Config(
                "GROQ_API_KEY not found in environment variables".into(),
            ));
        }
        if self.access.key.is_empty() {
            return Err(GatewayError::Config("access key must not be empty".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn find_config_file() -> Option<&'static str> {
        ["custom-config.toml", "config.toml"]
            .into_iter()
            .find(|name| Path::new(name).exists())
    }
}
