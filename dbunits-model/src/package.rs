use serde::Serialize;

use crate::entity::{Entity, EntityDescriptor};

/// Named set of entity types mapped by one persistence unit.
///
/// Registration order is preserved; it is also the order tables are created in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelPackage {
    name: String,
    entities: Vec<EntityDescriptor>,
}

impl ModelPackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    /// Registers `E`. Chainable.
    pub fn register<E: Entity>(mut self) -> Self {
        self.entities.push(E::descriptor());
        self
    }

    /// Registers a descriptor built by hand (e.g. generated code).
    pub fn register_descriptor(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Author;
    struct Book;

    impl Entity for Author {
        const TABLE: &'static str = "author";
        const COLUMNS: &'static [&'static str] = &["id", "name"];
        const DDL: &'static str =
            "CREATE TABLE IF NOT EXISTS author (id INTEGER PRIMARY KEY, name TEXT)";
    }

    impl Entity for Book {
        const TABLE: &'static str = "book";
        const COLUMNS: &'static [&'static str] = &["id", "author_id", "title"];
        const DDL: &'static str =
            "CREATE TABLE book (id INTEGER PRIMARY KEY, author_id INTEGER, title TEXT)";
    }

    #[test]
    fn keeps_registration_order() {
        let pkg = ModelPackage::new("library")
            .register::<Author>()
            .register::<Book>();
        let tables: Vec<_> = pkg.entities().iter().map(|e| e.table).collect();
        assert_eq!(tables, ["author", "book"]);
        assert_eq!(pkg.name(), "library");
        assert_eq!(pkg.len(), 2);
    }
}
