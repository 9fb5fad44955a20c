//! Bridge configuration.
//!
//! Stored in `sfbridge.toml` and covering the whole configuration
//! surface the bridge consumes: API credentials, the OAuth app
//! identifiers, the offline switch, and the multi-choice separator.
//! `SFBRIDGE_OFFLINE=1` in the environment forces offline mode
//! regardless of the file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "sfbridge.toml";

/// Environment override for the offline switch.
pub const OFFLINE_ENV_VAR: &str = "SFBRIDGE_OFFLINE";

fn default_login_url() -> String {
    "https://login.salesforce.com".to_string()
}

fn default_api_version() -> String {
    "38.0".to_string()
}

fn default_separator() -> String {
    ";".to_string()
}

/// Configuration consumed by [`crate::client::Connection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// API user for the resource-owner-password flow.
    pub username: String,
    pub password: String,
    /// Appended to the password when requesting a token.
    pub security_token: String,
    /// Connected-app consumer key.
    pub client_id: String,
    /// Connected-app consumer secret.
    pub client_secret: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// When set, every remote operation is a no-op returning its
    /// documented placeholder.
    #[serde(default)]
    pub offline: bool,
    /// Separator for multi-select picklist values.
    #[serde(default = "default_separator")]
    pub multichoice_separator: String,
}

impl BridgeConfig {
    /// Load from a TOML file and apply the environment override.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config: BridgeConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;
        if offline_env_override() {
            config.offline = true;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject configs missing a credential. Offline configs skip the
    /// check; they never reach the network.
    pub fn validate(&self) -> Result<()> {
        if self.offline {
            return Ok(());
        }
        let required: [(&'static str, &str); 4] = [
            ("username", &self.username),
            ("password", &self.password),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(sfb_core::Error::MissingSetting(name).into());
            }
        }
        Ok(())
    }

    /// An offline config with no credentials, for tests and degraded
    /// environments.
    pub fn offline() -> Self {
        BridgeConfig {
            username: String::new(),
            password: String::new(),
            security_token: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            login_url: default_login_url(),
            api_version: default_api_version(),
            offline: true,
            multichoice_separator: default_separator(),
        }
    }
}

fn offline_env_override() -> bool {
    match std::env::var(OFFLINE_ENV_VAR) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
