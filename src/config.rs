// src/config.rs

use std::env;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

use crate::blockchain::stats;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATS_SAMPLE_SIZE: u32 = 30;

// A struct to hold all configuration, loaded once at startup from the environment / .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,
    /// Serve MCP over stdin/stdout instead of HTTP
    pub mcp_mode: bool,

    /// Subscan API key. Tools that query Subscan fail with a
    /// missing-credential error when this is unset.
    pub subscan_api_key: Option<SecretString>,

    /// Number of recent blocks sampled for network stats (clamped to 3..=100)
    pub stats_sample_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            mcp_mode: false,
            subscan_api_key: None,
            stats_sample_size: DEFAULT_STATS_SAMPLE_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let subscan_api_key = env::var("SUBSCAN_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(SecretString::new);

        let stats_sample_size = env::var("STATS_SAMPLE_SIZE")
            .unwrap_or_else(|_| DEFAULT_STATS_SAMPLE_SIZE.to_string())
            .parse::<u32>()
            .context("STATS_SAMPLE_SIZE must be a valid number")?;

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .context("PORT must be a valid number")?,
            mcp_mode: env::var("MCP_MODE").is_ok(),
            subscan_api_key,
            stats_sample_size: stats::clamp_sample_size(stats_sample_size),
        })
    }

    /// Sets the Subscan API key; blank keys count as unset.
    pub fn with_subscan_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.subscan_api_key = (!key.trim().is_empty()).then(|| SecretString::new(key.trim().to_string()));
        self
    }

    pub fn subscan_api_key(&self) -> Option<&str> {
        self.subscan_api_key.as_ref().map(|key| key.expose_secret().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_credential() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.stats_sample_size, 30);
        assert!(config.subscan_api_key().is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        assert!(Config::default().with_subscan_api_key("   ").subscan_api_key().is_none());
        assert_eq!(
            Config::default().with_subscan_api_key(" abc ").subscan_api_key(),
            Some("abc")
        );
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = Config::default().with_subscan_api_key("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
