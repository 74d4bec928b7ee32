//! Scenario registry.
//!
//! Populated once during test-class setup, then read by every invocation
//! request. Writes take `&mut self`, so the setup phase has a single writer by
//! construction; [`ScenarioStore::freeze`] ends that phase and hands out a
//! cheap, thread-safe [`SharedStore`] for concurrent readers.

use casematrix_error::{Result, not_found};
use casematrix_group::ScenarioGroup;
use casematrix_ids::MethodId;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct ScenarioStore {
    groups: HashMap<MethodId, Arc<ScenarioGroup>>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the group for a method. Last registration wins.
    pub fn register(&mut self, method: impl Into<MethodId>, group: ScenarioGroup) -> &mut Self {
        self.groups.insert(method.into(), Arc::new(group));
        self
    }

    /// Batch registration for one test class.
    pub fn register_all<I, M>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (M, ScenarioGroup)>,
        M: Into<MethodId>,
    {
        for (method, group) in pairs {
            self.register(method, group);
        }
        self
    }

    pub fn lookup(&self, method: &str) -> Result<&ScenarioGroup> {
        self.groups
            .get(method)
            .map(Arc::as_ref)
            .ok_or_else(|| not_found(method))
    }

    pub fn lookup_shared(&self, method: &str) -> Result<Arc<ScenarioGroup>> {
        self.groups
            .get(method)
            .cloned()
            .ok_or_else(|| not_found(method))
    }

    pub fn contains(&self, method: &str) -> bool {
        self.groups.contains_key(method)
    }

    /// Registered identifiers, sorted.
    pub fn method_ids(&self) -> Vec<&MethodId> {
        let mut ids: Vec<&MethodId> = self.groups.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// End the setup phase.
    pub fn freeze(self) -> SharedStore {
        SharedStore(Arc::new(self))
    }
}

/// Read-only snapshot of a populated store.
#[derive(Clone, Debug, Default)]
pub struct SharedStore(Arc<ScenarioStore>);

impl Deref for SharedStore {
    type Target = ScenarioStore;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ScenarioStore> for SharedStore {
    fn from(store: ScenarioStore) -> Self {
        store.freeze()
    }
}
