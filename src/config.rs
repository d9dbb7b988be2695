//! Settings for the `labstage` binary, loaded with Figment.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. a TOML file (`--config`), if given
//! 3. environment variables prefixed with `LABSTAGE_`, nested with `__`
//!    (e.g. `LABSTAGE_STAGE__PORT=/dev/ttyUSB1`)
//!
//! ```toml
//! [stage]
//! port = "/dev/ttyUSB0"
//! baud_rate = 38400
//! ready_timeout_secs = 60
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use crate::logging::{parse_log_level, OutputFormat};
use anyhow::{bail, Context};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use labstage_driver_optosigma::Sbis26Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serial port used when nothing else is configured.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LABSTAGE_";

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Stage connection and polling
    pub stage: Sbis26Config,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (pretty, compact, json)
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: OutputFormat::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stage: Sbis26Config::new(DEFAULT_PORT),
            logging: LoggingSettings::default(),
        }
    }
}

/// Command-line values that win over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--port`
    pub port: Option<String>,
    /// `--baud`
    pub baud_rate: Option<u32>,
    /// `--log-level`
    pub log_level: Option<String>,
}

impl Settings {
    /// The layered Figment behind [`Settings::load`].
    ///
    /// An explicitly named file must exist; Figment would otherwise skip it
    /// silently.
    pub fn figment(path: Option<&Path>) -> anyhow::Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load defaults, then `path`, then the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let settings: Settings = Self::figment(path)?
            .extract()
            .context("Failed to load labstage settings")?;
        Ok(settings)
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(port) = &overrides.port {
            self.stage.port = port.clone();
        }
        if let Some(baud) = overrides.baud_rate {
            self.stage.baud_rate = baud;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> anyhow::Result<()> {
        self.stage.validate().context("Invalid [stage] settings")?;
        parse_log_level(&self.logging.level).map_err(anyhow::Error::msg)?;
        Ok(())
    }
}
