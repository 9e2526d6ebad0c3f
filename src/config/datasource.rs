use std::fmt;
use std::time::Duration;

use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::PersistenceError;

/// Database vendor behind a datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Sqlite,
}

impl Driver {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "sqlite" => Some(Driver::Sqlite),
            _ => None,
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Connection settings for one persistence unit, read from its own namespace.
#[derive(Clone, Deserialize)]
pub struct ConnectionSettings {
    /// Connection URL (required).
    /// TOML: `<ns>.url`. Example: `sqlite://data/write.db`.
    pub url: String,

    /// TOML: `<ns>.username`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub username: Option<String>,

    /// TOML: `<ns>.password`. Never logged.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub password: Option<String>,

    /// Vendor identifier. Inferred from the URL scheme when unset.
    /// TOML: `<ns>.driver`.
    #[serde(default)]
    pub driver: Option<Driver>,

    /// Open connections read-only.
    /// TOML: `<ns>.read_only`. Default: `false`.
    #[serde(default)]
    pub read_only: bool,

    /// Create the database file on first connect.
    /// TOML: `<ns>.create_if_missing`. Default: `true`.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// How long SQLite waits on a locked database before failing a statement.
    /// TOML: `<ns>.busy_timeout_ms`. Default: `5000`.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Pool tuning keys (sub-namespace).
    /// TOML: `[<ns>.pool]`.
    #[serde(default)]
    pub pool: PoolSettings,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("driver", &self.driver)
            .field("read_only", &self.read_only)
            .field("create_if_missing", &self.create_if_missing)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("pool", &self.pool)
            .finish()
    }
}

impl ConnectionSettings {
    /// Extracts and validates the settings stored under `namespace`.
    ///
    /// Keys this type does not know are ignored. A missing or blank `url`, an
    /// unsupported scheme or inconsistent pool bounds are reported here so
    /// they stop startup instead of surfacing on first use.
    pub fn from_figment(figment: &Figment, namespace: &str) -> Result<Self, PersistenceError> {
        if !figment.contains(&format!("{namespace}.url")) {
            return Err(PersistenceError::invalid_config(
                namespace,
                "missing required key `url`",
            ));
        }

        let mut settings: Self = figment.focus(namespace).extract()?;
        settings.driver = Some(settings.resolve_driver(namespace)?);
        settings.pool.validate(namespace)?;
        Ok(settings)
    }

    fn resolve_driver(&self, namespace: &str) -> Result<Driver, PersistenceError> {
        if self.url.trim().is_empty() {
            return Err(PersistenceError::invalid_config(
                namespace,
                "`url` must be non-empty",
            ));
        }
        let parsed = Url::parse(self.url.trim()).map_err(|e| {
            PersistenceError::invalid_config(namespace, format!("`url` is not a valid URL: {e}"))
        })?;
        let inferred = Driver::from_scheme(parsed.scheme()).ok_or_else(|| {
            PersistenceError::invalid_config(
                namespace,
                format!("unsupported URL scheme `{}`", parsed.scheme()),
            )
        })?;

        match self.driver {
            Some(explicit) if explicit != inferred => Err(PersistenceError::invalid_config(
                namespace,
                format!("driver `{explicit}` does not match URL scheme `{inferred}`"),
            )),
            _ => Ok(inferred),
        }
    }

    /// Resolved driver. Always set once loaded through [`Self::from_figment`].
    pub fn driver(&self) -> Driver {
        self.driver.unwrap_or(Driver::Sqlite)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

/// Pool-specific tuning, read from the `pool` sub-namespace of a datasource.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolSettings {
    /// Upper bound on open connections.
    /// TOML: `<ns>.pool.max_size`. Default: `10`.
    #[serde(default = "default_max_size")]
    pub max_size: u32,

    /// Connections kept open while idle.
    /// TOML: `<ns>.pool.min_idle`. Default: `0`.
    #[serde(default)]
    pub min_idle: u32,

    /// How long `acquire` blocks when every connection is in use.
    /// TOML: `<ns>.pool.acquire_timeout_ms`. Default: `30000`.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// TOML: `<ns>.pool.idle_timeout_ms`. Default: unset (no idle reaping).
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,

    /// TOML: `<ns>.pool.max_lifetime_ms`. Default: unset (no lifetime cap).
    #[serde(default)]
    pub max_lifetime_ms: Option<u64>,

    /// Ping connections before handing them out.
    /// TOML: `<ns>.pool.validate_on_acquire`. Default: `true`.
    #[serde(default = "default_validate_on_acquire")]
    pub validate_on_acquire: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            min_idle: 0,
            acquire_timeout_ms: default_acquire_timeout_ms(),
            idle_timeout_ms: None,
            max_lifetime_ms: None,
            validate_on_acquire: default_validate_on_acquire(),
        }
    }
}

impl PoolSettings {
    fn validate(&self, namespace: &str) -> Result<(), PersistenceError> {
        let ns = format!("{namespace}.pool");
        if self.max_size == 0 {
            return Err(PersistenceError::invalid_config(&ns, "`max_size` must be at least 1"));
        }
        if self.min_idle > self.max_size {
            return Err(PersistenceError::invalid_config(
                &ns,
                format!(
                    "`min_idle` ({}) exceeds `max_size` ({})",
                    self.min_idle, self.max_size
                ),
            ));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(PersistenceError::invalid_config(
                &ns,
                "`acquire_timeout_ms` must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_ms.map(Duration::from_millis)
    }
}

fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for datasource credentials",
        )),
    }
}

fn default_create_if_missing() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_max_size() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    30_000
}

fn default_validate_on_acquire() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Toml};

    fn figment(toml: &str) -> Figment {
        Figment::new().merge(Toml::string(toml))
    }

    #[test]
    fn infers_driver_from_scheme() {
        let fig = figment(
            r#"
            [write_datasource]
            url = "sqlite://write.db"
            "#,
        );
        let s = ConnectionSettings::from_figment(&fig, "write_datasource").unwrap();
        assert_eq!(s.driver(), Driver::Sqlite);
        assert_eq!(s.pool.max_size, 10);
        assert!(s.create_if_missing);
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let fig = figment(
            r#"
            [write_datasource]
            url = "mysql://localhost/app"
            "#,
        );
        let err = ConnectionSettings::from_figment(&fig, "write_datasource").unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme"), "{err}");
    }

    #[test]
    fn rejects_min_idle_above_max_size() {
        let fig = figment(
            r#"
            [write_datasource]
            url = "sqlite://write.db"
            [write_datasource.pool]
            max_size = 2
            min_idle = 3
            "#,
        );
        let err = ConnectionSettings::from_figment(&fig, "write_datasource").unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::InvalidConfig { ref namespace, .. }
                if namespace == "write_datasource.pool"
        ));
    }

    #[test]
    fn numeric_password_is_accepted_and_redacted() {
        let fig = figment(
            r#"
            [write_datasource]
            url = "sqlite://write.db"
            username = "app"
            password = 123456
            "#,
        );
        let s = ConnectionSettings::from_figment(&fig, "write_datasource").unwrap();
        assert_eq!(s.password.as_deref(), Some("123456"));
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("123456"));
        assert!(dbg.contains("<redacted>"));
    }
}
