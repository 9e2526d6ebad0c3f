use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::beans::BeanRegistry;

/// Property keys the crate itself reads or writes.
pub mod keys {
    /// Schema action at session factory build time: `none`, `validate` or `create`.
    pub const DDL_AUTO: &str = "schema.ddl_auto";
    pub const BATCH_SIZE: &str = "jdbc.batch_size";
    /// Milliseconds a transactional closure may run before it is rolled back.
    pub const TRANSACTION_TIMEOUT_MS: &str = "transaction.timeout_ms";
    /// Bean name of the `AuditorAware` implementation.
    pub const AUDITOR_REF: &str = "audit.auditor_ref";
    /// Set when a bean registry has been installed.
    pub const BEAN_CONTAINER: &str = "resources.beans.container";
    /// Informational; defaults to `resource-local`.
    pub const TRANSACTION_PLATFORM: &str = "transaction.platform";
    /// Must stay `false`: the session factory rejects any other value.
    pub const PROVIDER_DISABLES_AUTOCOMMIT: &str = "connection.provider_disables_autocommit";
}

/// Mutable key/value behavior flags, handed to customizers before finalization.
#[derive(Clone, Default)]
pub struct MappingProperties {
    values: BTreeMap<String, Value>,
    bean_container: Option<Arc<BeanRegistry>>,
}

impl fmt::Debug for MappingProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingProperties")
            .field("values", &self.values)
            .field("bean_container", &self.bean_container.is_some())
            .finish()
    }
}

impl MappingProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self {
            values,
            bean_container: None,
        }
    }

    /// Sets `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Sets `key` only when it has no value yet. Returns whether it was set.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.values.contains_key(key) {
            return false;
        }
        self.values.insert(key.to_string(), value.into());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Reads an unsigned integer, accepting numeric strings as set from env vars.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.values.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn install_bean_container(&mut self, registry: Arc<BeanRegistry>) {
        self.bean_container = Some(registry);
    }

    pub fn bean_container(&self) -> Option<&Arc<BeanRegistry>> {
        self.bean_container.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_if_absent_keeps_existing_value() {
        let mut props = MappingProperties::new();
        props.insert(keys::TRANSACTION_PLATFORM, "custom");
        assert!(!props.insert_if_absent(keys::TRANSACTION_PLATFORM, "resource-local"));
        assert_eq!(props.get_str(keys::TRANSACTION_PLATFORM), Some("custom"));
        assert!(props.insert_if_absent(keys::BATCH_SIZE, 20));
    }

    #[test]
    fn numeric_and_boolean_strings_are_read_leniently() {
        let mut props = MappingProperties::new();
        props.insert(keys::TRANSACTION_TIMEOUT_MS, "250");
        props.insert(keys::PROVIDER_DISABLES_AUTOCOMMIT, "true");
        assert_eq!(props.get_u64(keys::TRANSACTION_TIMEOUT_MS), Some(250));
        assert_eq!(props.get_bool(keys::PROVIDER_DISABLES_AUTOCOMMIT), Some(true));
        assert_eq!(props.get_u64(keys::PROVIDER_DISABLES_AUTOCOMMIT), None);
    }
}
