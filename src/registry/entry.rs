//! Per-key registry entries and their read-only snapshots.

use super::teardown::Teardown;
use crate::backend::{BackendHandle, EventType, ListenerToken};
use crate::descriptor::{Mode, SubscriptionDescriptor, ROOT_KEY};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Internal state of one live key.
pub(crate) struct RegistryEntry {
    pub(crate) descriptor: SubscriptionDescriptor,
    /// Distinguishes this incarnation from earlier ones of the same key.
    pub(crate) generation: u64,
    pub(crate) ref_count: usize,
    pub(crate) handle: Option<Arc<dyn BackendHandle>>,
    pub(crate) parent_edges: BTreeMap<String, usize>,
    pub(crate) child_teardowns: BTreeMap<String, Teardown>,
    pub(crate) field_teardowns: BTreeMap<String, Teardown>,
    pub(crate) listeners: Vec<(EventType, ListenerToken)>,
    /// List: initial read processed. Value: first update processed.
    pub(crate) initialized: bool,
}

/// Resources of a destroyed entry, released outside the registry lock.
pub(crate) struct ReleasedEntry {
    pub(crate) handle: Option<Arc<dyn BackendHandle>>,
    pub(crate) listeners: Vec<(EventType, ListenerToken)>,
    pub(crate) child_teardowns: Vec<Teardown>,
    pub(crate) field_teardowns: Vec<Teardown>,
}

impl RegistryEntry {
    pub(crate) fn new(descriptor: SubscriptionDescriptor, generation: u64, parent_key: &str) -> Self {
        let mut parent_edges = BTreeMap::new();
        parent_edges.insert(parent_key.to_string(), 1);
        Self {
            descriptor,
            generation,
            ref_count: 1,
            handle: None,
            parent_edges,
            child_teardowns: BTreeMap::new(),
            field_teardowns: BTreeMap::new(),
            listeners: Vec::new(),
            initialized: false,
        }
    }

    pub(crate) fn add_ref(&mut self, parent_key: &str) {
        self.ref_count += 1;
        *self.parent_edges.entry(parent_key.to_string()).or_insert(0) += 1;
    }

    /// Drop one reference held through `parent_key`.
    ///
    /// Returns true when no references remain.
    pub(crate) fn release_ref(&mut self, parent_key: &str) -> bool {
        self.ref_count = self.ref_count.saturating_sub(1);
        if let Some(count) = self.parent_edges.get_mut(parent_key) {
            *count -= 1;
            if *count == 0 {
                self.parent_edges.remove(parent_key);
            }
        }
        self.ref_count == 0
    }

    pub(crate) fn root_refs(&self) -> usize {
        self.parent_edges.get(ROOT_KEY).copied().unwrap_or(0)
    }

    pub(crate) fn is_live(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn release(self) -> ReleasedEntry {
        ReleasedEntry {
            handle: self.handle,
            listeners: self.listeners,
            child_teardowns: self.child_teardowns.into_values().collect(),
            field_teardowns: self.field_teardowns.into_values().collect(),
        }
    }

    pub(crate) fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            ref_count: self.ref_count,
            mode: self.descriptor.mode,
            locator: self.descriptor.locator.clone(),
            parent_edges: self.parent_edges.clone(),
            child_keys: self.child_teardowns.keys().cloned().collect(),
            field_keys: self.field_teardowns.keys().cloned().collect(),
        }
    }
}

impl ReleasedEntry {
    /// Stop listeners, then run every nested teardown once.
    pub(crate) fn run(mut self) {
        self.stop_listeners();
        for teardown in self.child_teardowns {
            teardown.run();
        }
        for teardown in self.field_teardowns {
            teardown.run();
        }
    }

    /// Release every listener token held on the backend handle.
    pub(crate) fn stop_listeners(&mut self) {
        if let Some(handle) = &self.handle {
            for (event, token) in self.listeners.drain(..) {
                handle.off_event(event, token);
            }
        }
    }
}

/// Diagnostic view of one registry entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub ref_count: usize,
    pub mode: Mode,
    pub locator: Value,
    /// Parent key to number of references held through it.
    pub parent_edges: BTreeMap<String, usize>,
    /// Child keys with live nested subscriptions.
    pub child_keys: Vec<String>,
    /// Field keys with live nested subscriptions.
    pub field_keys: Vec<String>,
}

/// Read-only copy of the whole registry, keyed by subscription key.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    pub entries: BTreeMap<String, EntrySnapshot>,
}

impl RegistrySnapshot {
    pub fn get(&self, key: &str) -> Option<&EntrySnapshot> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
