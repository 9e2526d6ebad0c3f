//! Mapping settings: base properties, ordered customizers and the optional bean registry.

mod beans;
mod customizer;
mod properties;
mod settings;

pub use beans::BeanRegistry;
pub use customizer::{PropertiesCustomizer, determine_customizers};
pub use properties::{MappingProperties, keys};
pub use settings::{MappingSettings, MappingSettingsBuilder};
