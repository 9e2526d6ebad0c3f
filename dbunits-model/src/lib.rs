pub mod entity;
pub mod package;

pub use entity::{Entity, EntityDescriptor};
pub use package::ModelPackage;
