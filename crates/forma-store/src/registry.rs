//! Explicit registry of stores keyed by string id.
//!
//! Independent call sites attach to "the same" store by agreeing on an id.
//! The registry is an ordinary constructible object, never ambient global
//! state, so tests build isolated registries. Stores are created on first
//! reference and never dropped automatically: `remove`/`clear` are the
//! explicit teardown API, and ids generated dynamically without teardown
//! accumulate for the registry's lifetime.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::store::{PathStore, StoreOptions};

#[derive(Default)]
pub struct StoreRegistry {
    stores: RefCell<BTreeMap<String, PathStore>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the store registered under `id`, creating it from `init`
    /// on first reference. `init` is not called when the id already exists.
    pub fn get_or_create<F>(&self, id: &str, init: F) -> PathStore
    where
        F: FnOnce() -> Value,
    {
        self.stores
            .borrow_mut()
            .entry(id.to_owned())
            .or_insert_with(|| PathStore::new(init()))
            .clone()
    }

    /// Like [`StoreRegistry::get_or_create`] with explicit store options.
    pub fn get_or_create_with<F>(&self, id: &str, init: F) -> PathStore
    where
        F: FnOnce() -> (Value, StoreOptions),
    {
        self.stores
            .borrow_mut()
            .entry(id.to_owned())
            .or_insert_with(|| {
                let (initial, options) = init();
                PathStore::with_options(initial, options)
            })
            .clone()
    }

    /// Handle to an existing store, if any.
    pub fn get(&self, id: &str) -> Option<PathStore> {
        self.stores.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stores.borrow().contains_key(id)
    }

    /// Drop the store registered under `id`. Returns whether one existed.
    /// Handles already cloned out stay usable; the registry just forgets it.
    pub fn remove(&self, id: &str) -> bool {
        self.stores.borrow_mut().remove(id).is_some()
    }

    /// Drop every registered store.
    pub fn clear(&self) {
        self.stores.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.stores.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.borrow().is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.stores.borrow().keys().cloned().collect()
    }
}
