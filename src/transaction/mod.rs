//! Transaction coordinator and the per-call unit of work.

mod manager;
mod unit_of_work;

use std::fmt;

pub use manager::TransactionManager;
pub use unit_of_work::UnitOfWork;

/// Lifecycle of one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Active,
    Committed,
    RolledBack,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TxState::Active => "active",
            TxState::Committed => "committed",
            TxState::RolledBack => "rolled_back",
        })
    }
}
