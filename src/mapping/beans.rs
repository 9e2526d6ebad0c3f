use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

/// Named helper objects the session factory may resolve instead of
/// constructing them itself (auditors, listeners, converters).
///
/// Beans are stored by value and handed out as clones, so shared beans are
/// usually registered as `Arc<dyn Trait>`.
#[derive(Default)]
pub struct BeanRegistry {
    beans: AHashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.beans.keys().collect();
        names.sort();
        f.debug_struct("BeanRegistry").field("beans", &names).finish()
    }
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bean` under `name`, replacing any previous bean of that name.
    pub fn register<T>(&mut self, name: impl Into<String>, bean: T)
    where
        T: Send + Sync + 'static,
    {
        self.beans.insert(name.into(), Arc::new(bean));
    }

    /// Chainable form of [`Self::register`].
    pub fn with<T>(mut self, name: impl Into<String>, bean: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.register(name, bean);
        self
    }

    /// Returns a clone of the bean named `name` if it exists and has type `T`.
    pub fn resolve<T>(&self, name: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.beans.get(name)?.downcast_ref::<T>().cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.beans.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Fixed;

    impl Greeter for Fixed {
        fn greet(&self) -> String {
            "hi".to_string()
        }
    }

    #[test]
    fn resolves_trait_objects_by_name_and_type() {
        let greeter: Arc<dyn Greeter> = Arc::new(Fixed);
        let registry = BeanRegistry::new().with("greeter", greeter).with("limit", 5_u32);

        let resolved = registry.resolve::<Arc<dyn Greeter>>("greeter").unwrap();
        assert_eq!(resolved.greet(), "hi");
        assert_eq!(registry.resolve::<u32>("limit"), Some(5));
        assert!(registry.resolve::<String>("limit").is_none());
        assert!(registry.resolve::<u32>("missing").is_none());
    }
}
