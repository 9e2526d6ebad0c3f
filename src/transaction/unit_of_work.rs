use std::sync::Arc;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use super::TxState;
use crate::error::PersistenceError;
use crate::session::{AuditStamp, AuditorAware};

/// One open transaction on a pooled connection.
///
/// Moves from `Active` to `Committed` or `RolledBack` exactly once. Dropping
/// it while still active rolls the transaction back.
pub struct UnitOfWork {
    id: Uuid,
    unit: String,
    tx: Option<Transaction<'static, Sqlite>>,
    state: TxState,
    auditor: Option<Arc<dyn AuditorAware>>,
}

impl UnitOfWork {
    pub(crate) fn new(
        unit: &str,
        tx: Transaction<'static, Sqlite>,
        auditor: Option<Arc<dyn AuditorAware>>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(unit, uow = %id, "transaction begun");
        Self {
            id,
            unit: unit.to_string(),
            tx: Some(tx),
            state: TxState::Active,
            auditor,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Connection to run statements on. Fails once the transaction has ended.
    pub fn connection(&mut self) -> Result<&mut SqliteConnection, PersistenceError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(PersistenceError::TransactionNotActive {
                unit: self.unit.clone(),
                state: self.state,
            }),
        }
    }

    pub fn audit_stamp(&self) -> AuditStamp {
        AuditStamp::now(self.auditor.as_ref())
    }

    pub async fn commit(&mut self) -> Result<(), PersistenceError> {
        let tx = self.take_active()?;
        if let Err(e) = tx.commit().await {
            // The connection is returned without a successful COMMIT; sqlx rolls it back.
            self.state = TxState::RolledBack;
            warn!(unit = %self.unit, uow = %self.id, error = %e, "commit failed");
            return Err(PersistenceError::Database(e));
        }
        self.state = TxState::Committed;
        debug!(unit = %self.unit, uow = %self.id, "transaction committed");
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), PersistenceError> {
        let tx = self.take_active()?;
        self.state = TxState::RolledBack;
        tx.rollback().await?;
        debug!(unit = %self.unit, uow = %self.id, "transaction rolled back");
        Ok(())
    }

    fn take_active(&mut self) -> Result<Transaction<'static, Sqlite>, PersistenceError> {
        self.tx.take().ok_or_else(|| PersistenceError::TransactionNotActive {
            unit: self.unit.clone(),
            state: self.state,
        })
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.tx.is_some() {
            debug!(unit = %self.unit, uow = %self.id, "active unit of work dropped; rolling back");
        }
    }
}
