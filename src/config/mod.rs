mod basic;
mod datasource;
mod mapping;

pub use basic::BasicConfig;
pub use datasource::{ConnectionSettings, Driver, PoolSettings};
pub use mapping::{MappingConfig, SchemaAction};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PersistenceError;

/// Namespace holding the write (primary) unit's datasource keys.
pub const WRITE_NAMESPACE: &str = "write_datasource";

/// Namespace holding the read unit's datasource keys.
pub const READ_NAMESPACE: &str = "read_datasource";

/// Environment variables with this prefix override file values.
/// `__` separates nesting levels: `DBUNITS_WRITE_DATASOURCE__POOL__MAX_SIZE=4`.
pub const ENV_PREFIX: &str = "DBUNITS_";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Sections that carry defaults. Datasources have none: `url` must be supplied.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
struct Defaults {
    #[serde(default)]
    basic: BasicConfig,
    #[serde(default)]
    mapping: MappingConfig,
}

/// Fully loaded and validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// See `[basic]` in config.toml.
    pub basic: BasicConfig,

    /// See `[mapping]` in config.toml.
    pub mapping: MappingConfig,

    /// See `[write_datasource]` in config.toml. Required.
    pub write: ConnectionSettings,

    /// See `[read_datasource]` in config.toml. Loaded only when the namespace is present.
    pub read: Option<ConnectionSettings>,
}

impl Config {
    /// Builds a Figment that merges defaults, `config.toml` if present, and `DBUNITS_*` env vars.
    pub fn figment() -> Figment {
        Self::figment_with_file(DEFAULT_CONFIG_FILE)
    }

    pub fn figment_with_file(path: impl AsRef<Path>) -> Figment {
        let path = path.as_ref();
        let figment = Figment::new().merge(Serialized::defaults(Defaults::default()));
        let figment = if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from the default sources.
    pub fn load() -> Result<Self, PersistenceError> {
        Self::from_figment(&Self::figment())
    }

    /// Extracts every section from `figment`, failing on the first invalid one.
    pub fn from_figment(figment: &Figment) -> Result<Self, PersistenceError> {
        let Defaults { basic, mapping } = figment.extract()?;
        let write = ConnectionSettings::from_figment(figment, WRITE_NAMESPACE)?;
        let read = if figment.contains(READ_NAMESPACE) {
            Some(ConnectionSettings::from_figment(figment, READ_NAMESPACE)?)
        } else {
            None
        };

        Ok(Self {
            basic,
            mapping,
            write,
            read,
        })
    }
}
