use serde::Serialize;

/// A persisted domain type.
///
/// Implementations are registered explicitly on a [`crate::ModelPackage`];
/// nothing is discovered at runtime.
pub trait Entity: Send + Sync + 'static {
    /// Table backing this entity.
    const TABLE: &'static str;

    /// Column names, primary key first.
    const COLUMNS: &'static [&'static str];

    /// `CREATE TABLE IF NOT EXISTS ...` statement used when the schema action is `create`.
    const DDL: &'static str;

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor {
            type_name: std::any::type_name::<Self>(),
            table: Self::TABLE,
            columns: Self::COLUMNS,
            ddl: Self::DDL,
        }
    }
}

/// Static mapping description of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    pub type_name: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub ddl: &'static str,
}

impl EntityDescriptor {
    pub fn primary_key(&self) -> Option<&'static str> {
        self.columns.first().copied()
    }
}
