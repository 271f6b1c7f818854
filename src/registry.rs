//! Keyed object store.
//!
//! A [`Registry`] maps a type plus an instance identifier to a shared object.
//! There is no process-wide registry: create one and pass it to whatever needs
//! it, which keeps lifetimes explicit and tests isolated.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Distinguishes several registered objects of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceId {
    Singleton,
    Named(String),
}

impl From<&str> for InstanceId {
    fn from(name: &str) -> Self {
        InstanceId::Named(name.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(name: String) -> Self {
        InstanceId::Named(name)
    }
}

type Key = (TypeId, InstanceId);

#[derive(Default)]
pub struct Registry {
    objects: RwLock<HashMap<Key, Arc<dyn Any + Send + Sync>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `object` as the singleton of its type, replacing any previous one.
    pub fn register<T: Any + Send + Sync>(&self, object: Arc<T>) -> Arc<T> {
        self.register_instance(object, InstanceId::Singleton)
    }

    pub fn register_instance<T: Any + Send + Sync>(
        &self,
        object: Arc<T>,
        instance: impl Into<InstanceId>,
    ) -> Arc<T> {
        let instance = instance.into();
        trace!(type_name = std::any::type_name::<T>(), ?instance, "register");
        self.objects
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert((TypeId::of::<T>(), instance), object.clone());
        object
    }

    pub fn lookup<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.lookup_instance(InstanceId::Singleton)
    }

    pub fn lookup_instance<T: Any + Send + Sync>(
        &self,
        instance: impl Into<InstanceId>,
    ) -> Option<Arc<T>> {
        let key = (TypeId::of::<T>(), instance.into());
        let objects = self.objects.read().unwrap_or_else(|p| p.into_inner());
        objects
            .get(&key)
            .cloned()
            .and_then(|object| object.downcast::<T>().ok())
    }

    /// Returns the registered singleton, creating and registering it with
    /// `factory` if there is none.
    pub fn require<T, F>(&self, factory: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let key = (TypeId::of::<T>(), InstanceId::Singleton);
        let mut objects = self.objects.write().unwrap_or_else(|p| p.into_inner());
        if let Some(existing) = objects.get(&key).cloned() {
            if let Ok(existing) = existing.downcast::<T>() {
                return existing;
            }
        }
        let created = Arc::new(factory());
        objects.insert(key, created.clone());
        created
    }

    pub fn unregister<T: Any + Send + Sync>(&self, instance: impl Into<InstanceId>) -> Option<Arc<T>> {
        let key = (TypeId::of::<T>(), instance.into());
        self.objects
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&key)
            .and_then(|object| object.downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("objects", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Endpoint(&'static str);

    #[test]
    fn test_singleton_and_named_instances_are_separate() {
        let registry = Registry::new();
        registry.register(Arc::new(Endpoint("default")));
        registry.register_instance(Arc::new(Endpoint("backup")), "backup");

        assert_eq!(registry.lookup::<Endpoint>().unwrap().0, "default");
        assert_eq!(registry.lookup_instance::<Endpoint>("backup").unwrap().0, "backup");
        assert!(registry.lookup_instance::<Endpoint>("missing").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_types_do_not_collide() {
        let registry = Registry::new();
        registry.register(Arc::new(1u32));
        registry.register(Arc::new(String::from("one")));
        assert_eq!(*registry.lookup::<u32>().unwrap(), 1);
        assert_eq!(registry.lookup::<String>().unwrap().as_str(), "one");
        assert!(registry.lookup::<u64>().is_none());
    }

    #[test]
    fn test_require_creates_once() {
        let registry = Registry::new();
        let first = registry.require(|| Endpoint("made"));
        let second = registry.require(|| Endpoint("not used"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.0, "made");
    }

    #[test]
    fn test_unregister() {
        let registry = Registry::new();
        registry.register_instance(Arc::new(Endpoint("x")), "x");
        assert_eq!(registry.unregister::<Endpoint>("x").unwrap().0, "x");
        assert!(registry.is_empty());
        assert!(registry.unregister::<Endpoint>("x").is_none());
    }
}
