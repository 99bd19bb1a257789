//! Configuration settings for the Compass channel
//!
//! This module defines the configuration structures that can be loaded from
//! TOML files and environment variables.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::error::CompassResult;
use crate::models::{Credentials, DEFAULT_TIMEOUT_SECS};
use crate::services::channel::CredentialsProvider;

// ============================================================================
// Default value functions
// ============================================================================

fn default_bot() -> String {
    "main".to_string()
}

fn default_base_url() -> String {
    "https://userbot.getcompass.com/api/v3/".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// ============================================================================
// Settings structures
// ============================================================================

/// Credentials of a single bot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    /// API token issued for the bot
    #[serde(default)]
    pub token: String,
}

/// Complete channel settings
///
/// All fields have defaults, so a missing configuration file yields a usable
/// (if tokenless) settings value. Tokens are validated at send time, when a
/// bot is actually selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Bot used when the payload does not select one
    #[serde(default = "default_bot")]
    pub default_bot: String,

    /// Configured bots, keyed by name
    #[serde(default)]
    pub bots: HashMap<String, BotSettings>,

    /// Base URL all JSON endpoints are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_bot: default_bot(),
            bots: HashMap::new(),
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Settings {
    /// Validates the loaded settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_bot.is_empty() {
            return Err(ConfigError::validation(
                "default_bot",
                "default bot name cannot be empty",
            ));
        }

        if self.base_url.is_empty() {
            return Err(ConfigError::validation(
                "base_url",
                "base URL cannot be empty",
            ));
        }

        if self.timeout == 0 {
            return Err(ConfigError::validation(
                "timeout",
                "timeout must be positive",
            ));
        }

        Ok(())
    }
}

impl CredentialsProvider for Settings {
    fn default_bot(&self) -> &str {
        &self.default_bot
    }

    /// Builds the credential triple for the named bot.
    ///
    /// An unknown bot name yields an empty token and therefore the same
    /// invalid-argument error as an explicitly empty one.
    fn credentials_for(&self, bot: &str) -> CompassResult<Credentials> {
        let token = self
            .bots
            .get(bot)
            .map(|bot| bot.token.as_str())
            .unwrap_or_default();

        Credentials::new(
            token,
            self.base_url.as_str(),
            Some(Duration::from_secs(self.timeout)),
        )
    }
}
