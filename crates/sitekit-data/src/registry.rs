//! Store registry

use std::{any::Any, collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    error::{Result, StoreError},
    store::Store,
};

struct RegisteredStore {
    store: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    reset: Box<dyn Fn() + Send + Sync>,
}

/// Process-wide mapping from store name to store.
///
/// Created once at application start and passed by reference; call
/// [`Registry::teardown`] to drop every store (test isolation).
#[derive(Default)]
pub struct Registry {
    stores: RwLock<HashMap<String, RegisteredStore>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` under `name`. Names are unique for the registry's
    /// lifetime.
    pub fn register_store<S: Store>(&self, name: &str, store: Arc<S>) -> Result<()> {
        let mut stores = self.stores.write();
        if stores.contains_key(name) {
            return Err(StoreError::AlreadyRegistered(name.to_string()));
        }

        let for_reset = Arc::clone(&store);
        stores.insert(
            name.to_string(),
            RegisteredStore {
                store,
                type_name: std::any::type_name::<S>(),
                reset: Box::new(move || for_reset.core().reset()),
            },
        );
        info!(store = name, "Registered store");
        Ok(())
    }

    /// Selectors of the store registered under `name`
    pub fn select<S: Store>(&self, name: &str) -> Result<Arc<S>> {
        self.lookup(name)
    }

    /// Actions of the store registered under `name`
    pub fn dispatch<S: Store>(&self, name: &str) -> Result<Arc<S>> {
        self.lookup(name)
    }

    fn lookup<S: Store>(&self, name: &str) -> Result<Arc<S>> {
        let stores = self.stores.read();
        let entry = stores
            .get(name)
            .ok_or_else(|| StoreError::NotRegistered(name.to_string()))?;

        Arc::clone(&entry.store)
            .downcast::<S>()
            .map_err(|_| {
                debug!(store = name, actual = entry.type_name, "Store type mismatch");
                StoreError::TypeMismatch {
                    name: name.to_string(),
                    expected: std::any::type_name::<S>(),
                }
            })
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.stores.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop resolution records and captured errors of every store, keeping
    /// registrations.
    pub fn reset_resolution(&self) {
        for entry in self.stores.read().values() {
            (entry.reset)();
        }
    }

    /// Remove every store
    pub fn teardown(&self) {
        let mut stores = self.stores.write();
        debug!(count = stores.len(), "Tearing down registry");
        stores.clear();
    }
}
