//! Runner configuration

use std::path::Path;

use domain_underwriting::UnderwritingConfig;
use serde::Deserialize;

/// Prefix of environment overrides, e.g. `UNDERWRITING__ENGINE__BANDS__HIGH=80`
pub const ENV_PREFIX: &str = "UNDERWRITING";

/// Runner configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: Option<String>,
    /// Emit logs as JSON lines instead of human readable text
    pub json_logs: bool,
    /// Engine configuration
    pub engine: UnderwritingConfig,
}

impl AppConfig {
    /// Loads configuration from an optional file, then environment overrides
    ///
    /// The file format is inferred from its extension (TOML, JSON, YAML).
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
