//! Session factory: validated mapping metadata bound to one pool and one settings object.

mod audit;
mod factory;
mod metadata;

pub use audit::{AuditStamp, AuditorAware, FixedAuditor};
pub use factory::{Session, SessionFactory, SessionFactoryBuilder};
pub use metadata::Metadata;
