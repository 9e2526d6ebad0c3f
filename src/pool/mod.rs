//! Bounded SQLite connection pool owned by exactly one persistence unit.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::config::{ConnectionSettings, Driver};
use crate::error::PersistenceError;

/// Point-in-time occupancy of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
    pub max_size: u32,
}

struct PoolInner {
    unit: String,
    pool: SqlitePool,
    driver: Driver,
    read_only: bool,
    max_size: u32,
    acquire_timeout: Duration,
}

/// Cloneable handle; clones share the same underlying connections.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("unit", &self.inner.unit)
            .field("driver", &self.inner.driver)
            .field("read_only", &self.inner.read_only)
            .field("max_size", &self.inner.max_size)
            .field("acquire_timeout", &self.inner.acquire_timeout)
            .finish_non_exhaustive()
    }
}

impl ConnectionPool {
    /// Opens the pool for `unit` and establishes its first connection, so an
    /// unreachable or unopenable database fails here rather than on first use.
    pub async fn connect(
        unit: &str,
        settings: &ConnectionSettings,
    ) -> Result<Self, PersistenceError> {
        let pool_init = |source: sqlx::Error| PersistenceError::PoolInit {
            unit: unit.to_string(),
            source,
        };

        let driver = settings.driver();
        if settings.has_credentials() {
            warn!(unit, %driver, "datasource credentials are not used by this driver");
        }

        let mut connect_opts = SqliteConnectOptions::from_str(settings.url.trim())
            .map_err(pool_init)?
            .create_if_missing(settings.create_if_missing && !settings.read_only)
            .busy_timeout(settings.busy_timeout())
            .read_only(settings.read_only);
        // Switching journal mode needs a writable connection.
        if !settings.read_only {
            connect_opts = connect_opts
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let tuning = &settings.pool;
        let pool = SqlitePoolOptions::new()
            .max_connections(tuning.max_size)
            .min_connections(tuning.min_idle)
            .acquire_timeout(tuning.acquire_timeout())
            .idle_timeout(tuning.idle_timeout())
            .max_lifetime(tuning.max_lifetime())
            .test_before_acquire(tuning.validate_on_acquire)
            .connect_with(connect_opts)
            .await
            .map_err(pool_init)?;

        info!(
            unit,
            %driver,
            read_only = settings.read_only,
            max_size = tuning.max_size,
            min_idle = tuning.min_idle,
            acquire_timeout_ms = tuning.acquire_timeout_ms,
            "connection pool initialized"
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                unit: unit.to_string(),
                pool,
                driver,
                read_only: settings.read_only,
                max_size: tuning.max_size,
                acquire_timeout: tuning.acquire_timeout(),
            }),
        })
    }

    /// Checks out one connection, waiting at most the configured acquire timeout.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, PersistenceError> {
        self.inner
            .pool
            .acquire()
            .await
            .map_err(|e| self.acquire_error(e))
    }

    /// Checks out a connection and opens a transaction on it.
    pub(crate) async fn begin(&self) -> Result<Transaction<'static, Sqlite>, PersistenceError> {
        self.inner
            .pool
            .begin()
            .await
            .map_err(|e| self.acquire_error(e))
    }

    fn acquire_error(&self, err: sqlx::Error) -> PersistenceError {
        match err {
            sqlx::Error::PoolTimedOut => PersistenceError::PoolTimeout {
                unit: self.inner.unit.clone(),
                timeout: self.inner.acquire_timeout,
            },
            other => PersistenceError::Database(other),
        }
    }

    pub fn unit(&self) -> &str {
        &self.inner.unit
    }

    pub fn driver(&self) -> Driver {
        self.inner.driver
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read_only
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.inner.acquire_timeout
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.inner.pool.size(),
            idle: self.inner.pool.num_idle(),
            max_size: self.inner.max_size,
        }
    }

    /// Underlying sqlx pool, for statements that need no transaction.
    pub fn as_sqlx(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// True when both handles refer to the same pool.
    pub fn same_pool(&self, other: &ConnectionPool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Waits for checked-out connections to return, then closes everything.
    pub async fn close(&self) {
        self.inner.pool.close().await;
        info!(unit = %self.inner.unit, "connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.pool.is_closed()
    }
}
