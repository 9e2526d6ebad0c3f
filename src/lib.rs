pub mod bootstrap;
pub mod config;
pub mod error;
pub mod mapping;
pub mod pool;
pub mod session;
pub mod transaction;

mod utils;

pub use bootstrap::{
    Bootstrap, MODEL_PACKAGE, PersistenceUnit, PersistenceUnits, READ_UNIT, WRITE_UNIT,
};
pub use dbunits_model as model;
pub use error::PersistenceError;
pub use pool::ConnectionPool;
pub use session::{AuditorAware, SessionFactory};
pub use transaction::{TransactionManager, TxState, UnitOfWork};
