//! Name to worker-handle lookup.
//!
//! Lets the aggregator reach a single worker by service name without
//! broadcasting to every worker.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tokio::sync::RwLock;

use crate::error::RegistryError;
use crate::worker::WorkerHandle;

/// Concurrency-safe map from service name to handle
#[derive(Debug)]
pub struct Registry<H = WorkerHandle> {
    entries: RwLock<HashMap<String, H>>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<H: Clone> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `name`; fails if the name is taken
    ///
    /// The check and the insert happen under one write lock, so of two racing
    /// registrations for the same name exactly one wins.
    pub async fn register(&self, name: &str, handle: H) -> Result<(), RegistryError> {
        match self.entries.write().await.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    pub async fn lookup(&self, name: &str) -> Result<H, RegistryError> {
        self.entries
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Remove `name`, returning the handle it pointed to
    pub async fn unregister(&self, name: &str) -> Result<H, RegistryError> {
        self.entries
            .write()
            .await
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Remove `name` only if its current handle satisfies `predicate`
    ///
    /// Returns whether an entry was removed.
    pub async fn unregister_if(&self, name: &str, predicate: impl FnOnce(&H) -> bool) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(name) {
            Some(handle) if predicate(handle) => {
                entries.remove(name);
                true
            }
            _ => false,
        }
    }

    /// All registered names, in no particular order
    pub async fn list_names(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// Copy of every registration, in no particular order
    pub async fn entries(&self) -> Vec<(String, H)> {
        self.entries.read().await.iter().map(|(name, handle)| (name.clone(), handle.clone())).collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
