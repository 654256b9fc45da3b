//! Shared configuration for the livewire bridge and its connectors.
//!
//! Configuration is layered with [`figment`]: compiled-in defaults first, then
//! environment variables carrying the [`ENV_PREFIX`] prefix. Both the bridge
//! (which binds the endpoint) and the connector (which dials it) read the same
//! structure so they agree on host and port without extra wiring.

mod defaults;
mod endpoint;
mod logging;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, ENV_PREFIX, default_log_filter,
    default_log_format,
};
pub use endpoint::{Endpoint, EndpointParseError, ResolveError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration consumed by the bridge and connector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Host the bridge binds to and the connector dials.
    pub host: String,
    /// TCP port for the bridge.
    pub port: u16,
    /// `tracing` filter expression.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider produced a value that does not fit the schema.
    #[error("failed to load configuration: {source}")]
    Extract {
        #[source]
        source: Box<figment::Error>,
    },
}

impl Config {
    /// Loads configuration from defaults and `LIVEWIRE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extract`] when an override cannot be parsed, for
    /// example a non-numeric `LIVEWIRE_PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::figment())
    }

    /// Builds the provider stack used by [`Config::load`].
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extracts configuration from an explicit provider stack.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extract`] when extraction fails.
    pub fn load_from(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|source| ConfigError::Extract {
            source: Box::new(source),
        })
    }

    /// Endpoint the bridge listens on.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
