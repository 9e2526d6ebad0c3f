use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::beans::BeanRegistry;
use super::customizer::PropertiesCustomizer;
use super::properties::{MappingProperties, keys};
use crate::utils::logging::pretty_json_if_debug;

/// Frozen mapping properties for one persistence unit.
///
/// Only [`MappingSettingsBuilder::finalize`] creates this type, and it exposes no
/// mutation, so every customizer has run exactly once before anything reads it.
#[derive(Debug, Clone)]
pub struct MappingSettings {
    properties: MappingProperties,
}

impl MappingSettings {
    pub fn builder(base: MappingProperties) -> MappingSettingsBuilder {
        MappingSettingsBuilder {
            base,
            customizers: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get_str(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.properties.get_u64(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.properties.get_bool(key)
    }

    pub fn properties(&self) -> &MappingProperties {
        &self.properties
    }

    pub fn bean_container(&self) -> Option<&Arc<BeanRegistry>> {
        self.properties.bean_container()
    }

    pub fn transaction_timeout(&self) -> Option<Duration> {
        self.get_u64(keys::TRANSACTION_TIMEOUT_MS)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn auditor_ref(&self) -> Option<&str> {
        self.get_str(keys::AUDITOR_REF).filter(|s| !s.trim().is_empty())
    }
}

/// Collects customizers in registration order.
pub struct MappingSettingsBuilder {
    base: MappingProperties,
    customizers: Vec<Arc<dyn PropertiesCustomizer>>,
}

impl MappingSettingsBuilder {
    pub fn customizer(mut self, customizer: impl PropertiesCustomizer + 'static) -> Self {
        self.customizers.push(Arc::new(customizer));
        self
    }

    pub fn customizers<I>(mut self, customizers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn PropertiesCustomizer>>,
    {
        self.customizers.extend(customizers);
        self
    }

    /// Applies each customizer once, in registration order, then fills the
    /// vendor defaults that are still absent.
    pub fn finalize(self) -> MappingSettings {
        let MappingSettingsBuilder {
            mut base,
            customizers,
        } = self;

        for customizer in &customizers {
            customizer.customize(&mut base);
        }
        customize_vendor_properties(&mut base);

        if let Some(json) = pretty_json_if_debug(base.values()) {
            debug!(
                customizers = customizers.len(),
                properties = %json,
                "mapping settings finalized"
            );
        }

        MappingSettings { properties: base }
    }
}

/// Records how the local transaction coordinator actually behaves, without
/// overriding values a deployment set explicitly.
fn customize_vendor_properties(properties: &mut MappingProperties) {
    properties.insert_if_absent(keys::TRANSACTION_PLATFORM, "resource-local");
    properties.insert_if_absent(keys::PROVIDER_DISABLES_AUTOCOMMIT, false);
}
