use std::sync::Arc;

use tracing::debug;

use super::beans::BeanRegistry;
use super::properties::{MappingProperties, keys};
use crate::config::MappingConfig;

/// Callback that may add or override mapping properties before they are frozen.
pub trait PropertiesCustomizer: Send + Sync {
    fn customize(&self, properties: &mut MappingProperties);
}

impl<F> PropertiesCustomizer for F
where
    F: Fn(&mut MappingProperties) + Send + Sync,
{
    fn customize(&self, properties: &mut MappingProperties) {
        self(properties);
    }
}

/// Installs a bean registry as the resolution strategy for helper objects.
struct BeanContainerCustomizer {
    registry: Arc<BeanRegistry>,
}

impl PropertiesCustomizer for BeanContainerCustomizer {
    fn customize(&self, properties: &mut MappingProperties) {
        properties.install_bean_container(self.registry.clone());
        properties.insert(keys::BEAN_CONTAINER, "registry");
    }
}

/// Final customizer list for a unit: the bean-container customizer first
/// (when enabled and a registry exists), then `registered` in order.
pub fn determine_customizers(
    cfg: &MappingConfig,
    registry: Option<&Arc<BeanRegistry>>,
    registered: &[Arc<dyn PropertiesCustomizer>],
) -> Vec<Arc<dyn PropertiesCustomizer>> {
    let mut customizers: Vec<Arc<dyn PropertiesCustomizer>> =
        Vec::with_capacity(registered.len() + 1);

    match (cfg.bean_container, registry) {
        (true, Some(registry)) => {
            customizers.push(Arc::new(BeanContainerCustomizer {
                registry: registry.clone(),
            }));
        }
        (true, None) => debug!("no bean registry supplied; bean container customizer skipped"),
        (false, _) => debug!("bean container disabled by configuration"),
    }

    customizers.extend(registered.iter().cloned());
    customizers
}
