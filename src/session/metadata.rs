use ahash::AHashSet;
use dbunits_model::{EntityDescriptor, ModelPackage};
use serde::Serialize;

use crate::error::PersistenceError;

/// Validated mapping description of one model package.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    package: String,
    entities: Vec<EntityDescriptor>,
}

impl Metadata {
    /// Checks every registered entity and freezes the result.
    ///
    /// Rejects an unnamed package, blank table names, duplicate tables,
    /// entities without columns or DDL, and repeated column names.
    pub fn build(unit: &str, package: &ModelPackage) -> Result<Self, PersistenceError> {
        if package.name().trim().is_empty() {
            return Err(PersistenceError::metadata(unit, "model package has no name"));
        }

        let mut tables = AHashSet::with_capacity(package.len());
        for entity in package.entities() {
            let ty = entity.type_name;
            if entity.table.trim().is_empty() {
                return Err(PersistenceError::metadata(
                    unit,
                    format!("entity `{ty}` has an empty table name"),
                ));
            }
            if !tables.insert(entity.table) {
                return Err(PersistenceError::metadata(
                    unit,
                    format!("table `{}` is mapped more than once (last by `{ty}`)", entity.table),
                ));
            }
            if entity.columns.is_empty() {
                return Err(PersistenceError::metadata(
                    unit,
                    format!("entity `{ty}` declares no columns"),
                ));
            }
            let mut columns = AHashSet::with_capacity(entity.columns.len());
            if let Some(dup) = entity.columns.iter().find(|c| !columns.insert(**c)) {
                return Err(PersistenceError::metadata(
                    unit,
                    format!("entity `{ty}` declares column `{dup}` twice"),
                ));
            }
            if entity.ddl.trim().is_empty() {
                return Err(PersistenceError::metadata(
                    unit,
                    format!("entity `{ty}` has no DDL"),
                ));
            }
        }

        Ok(Self {
            package: package.name().to_string(),
            entities: package.entities().to_vec(),
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    pub fn entity(&self, table: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.table == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbunits_model::Entity;

    struct Note;

    impl Entity for Note {
        const TABLE: &'static str = "note";
        const COLUMNS: &'static [&'static str] = &["id", "body"];
        const DDL: &'static str =
            "CREATE TABLE IF NOT EXISTS note (id INTEGER PRIMARY KEY, body TEXT)";
    }

    struct NoteAgain;

    impl Entity for NoteAgain {
        const TABLE: &'static str = "note";
        const COLUMNS: &'static [&'static str] = &["id"];
        const DDL: &'static str = "CREATE TABLE IF NOT EXISTS note (id INTEGER PRIMARY KEY)";
    }

    struct Tag;

    impl Entity for Tag {
        const TABLE: &'static str = "tag";
        const COLUMNS: &'static [&'static str] = &["id", "label", "label"];
        const DDL: &'static str =
            "CREATE TABLE IF NOT EXISTS tag (id INTEGER PRIMARY KEY, label TEXT)";
    }

    #[test]
    fn builds_from_a_valid_package() {
        let md = Metadata::build("write", &ModelPackage::new("domain").register::<Note>()).unwrap();
        assert_eq!(md.package(), "domain");
        assert!(md.entity("note").is_some());
        assert!(md.entity("tag").is_none());
    }

    #[test]
    fn rejects_duplicate_tables() {
        let pkg = ModelPackage::new("domain").register::<Note>().register::<NoteAgain>();
        let err = Metadata::build("write", &pkg).unwrap_err();
        assert!(err.to_string().contains("mapped more than once"), "{err}");
        assert!(err.is_startup_failure());
    }

    #[test]
    fn rejects_repeated_columns() {
        let pkg = ModelPackage::new("domain").register::<Tag>();
        let err = Metadata::build("write", &pkg).unwrap_err();
        assert!(err.to_string().contains("column `label` twice"), "{err}");
    }

    #[test]
    fn rejects_unnamed_package() {
        assert!(Metadata::build("write", &ModelPackage::new("  ")).is_err());
    }
}
