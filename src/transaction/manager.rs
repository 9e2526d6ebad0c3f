use futures::future::BoxFuture;
use tracing::warn;

use super::unit_of_work::UnitOfWork;
use crate::error::PersistenceError;
use crate::session::SessionFactory;

/// Opens transaction boundaries against one session factory. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    factory: SessionFactory,
}

impl TransactionManager {
    pub fn new(factory: SessionFactory) -> Self {
        Self { factory }
    }

    pub fn unit(&self) -> &str {
        self.factory.unit()
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    /// Starts a unit of work, waiting at most the pool's acquire timeout for a connection.
    pub async fn begin(&self) -> Result<UnitOfWork, PersistenceError> {
        let tx = self.factory.pool().begin().await?;
        Ok(UnitOfWork::new(
            self.factory.unit(),
            tx,
            self.factory.auditor().cloned(),
        ))
    }

    /// Runs `work` inside a fresh unit of work.
    ///
    /// `Ok` commits; `Err` rolls back and is returned as-is. When
    /// `transaction.timeout_ms` is set, overrunning it rolls back with
    /// [`PersistenceError::TransactionTimeout`].
    pub async fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'u> FnOnce(&'u mut UnitOfWork) -> BoxFuture<'u, Result<T, E>>,
        E: From<PersistenceError>,
    {
        let mut uow = self.begin().await?;

        let outcome = match self.factory.settings().transaction_timeout() {
            Some(limit) => match tokio::time::timeout(limit, work(&mut uow)).await {
                Ok(res) => res,
                Err(_) => Err(E::from(PersistenceError::TransactionTimeout {
                    unit: self.factory.unit().to_string(),
                    timeout: limit,
                })),
            },
            None => work(&mut uow).await,
        };

        match outcome {
            Ok(value) => {
                uow.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(
                        unit = %self.factory.unit(),
                        uow = %uow.id(),
                        error = %rollback_err,
                        "rollback after failed unit of work did not complete"
                    );
                }
                Err(err)
            }
        }
    }
}
