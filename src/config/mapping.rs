use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::{MappingProperties, keys};

/// What the session factory does with the schema of the mapped tables at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaAction {
    /// Leave the schema alone.
    #[default]
    None,
    /// Fail the build when a mapped table is missing.
    Validate,
    /// Run each entity's `CREATE TABLE IF NOT EXISTS` statement.
    Create,
}

impl SchemaAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaAction::None => "none",
            SchemaAction::Validate => "validate",
            SchemaAction::Create => "create",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SchemaAction::None),
            "validate" => Some(SchemaAction::Validate),
            "create" => Some(SchemaAction::Create),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping behavior shared by every persistence unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    /// TOML: `mapping.ddl_auto`. Default: `none`.
    #[serde(default)]
    pub ddl_auto: SchemaAction,

    /// Statement batch size hint for repositories.
    /// TOML: `mapping.batch_size`. Default: unset.
    #[serde(default)]
    pub batch_size: Option<u32>,

    /// Upper bound on a transactional closure run through `in_transaction`.
    /// TOML: `mapping.transaction_timeout_ms`. Default: unset (unbounded).
    #[serde(default)]
    pub transaction_timeout_ms: Option<u64>,

    /// Name of the auditor bean used to stamp changes.
    /// TOML: `mapping.auditor_ref`. Default: unset (auditing off).
    #[serde(default)]
    pub auditor_ref: Option<String>,

    /// Install the bean registry (when one is supplied) as the resolution
    /// strategy for helper objects.
    /// TOML: `mapping.bean_container`. Default: `true`.
    #[serde(default = "default_bean_container")]
    pub bean_container: bool,

    /// Vendor-specific flags passed through untouched.
    /// TOML: `[mapping.properties]`.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            ddl_auto: SchemaAction::default(),
            batch_size: None,
            transaction_timeout_ms: None,
            auditor_ref: None,
            bean_container: default_bean_container(),
            properties: BTreeMap::new(),
        }
    }
}

impl MappingConfig {
    /// Base properties before any customizer runs.
    ///
    /// The generic bag is laid down first; typed fields override it when set.
    pub fn determine_properties(&self) -> MappingProperties {
        let mut props = MappingProperties::from_values(self.properties.clone());
        props.insert(keys::DDL_AUTO, self.ddl_auto.as_str());
        if let Some(batch_size) = self.batch_size {
            props.insert(keys::BATCH_SIZE, batch_size);
        }
        if let Some(timeout_ms) = self.transaction_timeout_ms {
            props.insert(keys::TRANSACTION_TIMEOUT_MS, timeout_ms);
        }
        if let Some(auditor_ref) = &self.auditor_ref {
            props.insert(keys::AUDITOR_REF, auditor_ref.as_str());
        }
        props
    }
}

fn default_bean_container() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_fields_override_the_generic_bag() {
        let mut cfg = MappingConfig {
            ddl_auto: SchemaAction::Validate,
            batch_size: Some(50),
            ..Default::default()
        };
        cfg.properties
            .insert(keys::DDL_AUTO.to_string(), Value::from("create"));
        cfg.properties
            .insert("vendor.fetch_size".to_string(), Value::from(200));

        let props = cfg.determine_properties();
        assert_eq!(props.get_str(keys::DDL_AUTO), Some("validate"));
        assert_eq!(props.get_u64(keys::BATCH_SIZE), Some(50));
        assert_eq!(props.get_u64("vendor.fetch_size"), Some(200));
        assert!(!props.contains_key(keys::AUDITOR_REF));
    }

    #[test]
    fn schema_action_round_trips_through_its_name() {
        for action in [SchemaAction::None, SchemaAction::Validate, SchemaAction::Create] {
            assert_eq!(SchemaAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(SchemaAction::parse("update"), None);
    }
}
