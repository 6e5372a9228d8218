//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::{Error, Result};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MODEM_STATS_";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Modem command configuration
    pub modem: ModemConfig,
    /// Page rendering configuration
    pub page: PageConfig,
}

impl Config {
    /// Load configuration from defaults, an optional YAML file and the
    /// environment, in increasing order of precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `--port` and `--host`, which take precedence over every
    /// other source
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(ref host) = cli.host {
            self.server.host.clone_from(host);
        }
    }

    /// Check invariants that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config(
                "Port must be between 1 and 65535".to_string(),
            ));
        }
        if self.cache.window.is_zero() {
            return Err(Error::Config("Cache window must be non-zero".to_string()));
        }
        if self.modem.program.trim().is_empty() {
            return Err(Error::Config("Modem program must be set".to_string()));
        }
        if self.modem.commands.is_empty() {
            return Err(Error::Config(
                "At least one modem command must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a collected page is served before the modem is polled again
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Refresh the page once per window in the background
    pub background_refresh: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(500),
            background_refresh: false,
        }
    }
}

/// Modem command configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Program that talks to the modem
    pub program: String,
    /// Arguments passed before each AT command
    pub args: Vec<String>,
    /// AT commands to run, in display order
    pub commands: Vec<String>,
    /// Per-command timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            program: "gl_modem".to_string(),
            args: vec!["-D".to_string(), "AT".to_string()],
            commands: vec![
                "AT+QCAINFO".to_string(),
                r#"AT+QENG="servingcell""#.to_string(),
                r#"AT+QENG="neighbourcell""#.to_string(),
                r#"AT+QNWCFG="up/down""#.to_string(),
            ],
            timeout: Duration::from_secs(5),
        }
    }
}

/// Page rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Document title
    pub title: String,
    /// Browser auto-refresh interval in seconds
    pub refresh: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Signal Statistics".to_string(),
            refresh: 1,
        }
    }
}
