use std::time::Duration;

use thiserror::Error as ThisError;

use crate::transaction::TxState;

#[derive(Debug, ThisError)]
pub enum PersistenceError {
    #[error("Configuration load error: {0}")]
    Figment(Box<figment::Error>),

    #[error("Invalid configuration under `{namespace}`: {reason}")]
    InvalidConfig { namespace: String, reason: String },

    #[error("Connection pool for unit `{unit}` failed to initialize: {source}")]
    PoolInit {
        unit: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Mapping metadata for unit `{unit}` failed to build: {reason}")]
    Metadata { unit: String, reason: String },

    #[error("Timed out after {timeout:?} waiting for a connection from unit `{unit}`")]
    PoolTimeout { unit: String, timeout: Duration },

    #[error("Transaction on unit `{unit}` is no longer active (state: {state})")]
    TransactionNotActive { unit: String, state: TxState },

    #[error("Transaction on unit `{unit}` exceeded {timeout:?} and was rolled back")]
    TransactionTimeout { unit: String, timeout: Duration },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<figment::Error> for PersistenceError {
    fn from(err: figment::Error) -> Self {
        PersistenceError::Figment(Box::new(err))
    }
}

impl PersistenceError {
    pub(crate) fn invalid_config(namespace: &str, reason: impl Into<String>) -> Self {
        PersistenceError::InvalidConfig {
            namespace: namespace.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn metadata(unit: &str, reason: impl Into<String>) -> Self {
        PersistenceError::Metadata {
            unit: unit.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors that must stop the process before it serves anything.
    ///
    /// Everything else surfaces to the calling unit of work.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            PersistenceError::Figment(_)
                | PersistenceError::InvalidConfig { .. }
                | PersistenceError::PoolInit { .. }
                | PersistenceError::Metadata { .. }
        )
    }
}
