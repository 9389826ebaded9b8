//! Subscription registry: ref-counted entries, List/Value reconciliation,
//! cycle checks and readiness bookkeeping.

use super::config::{DataEvent, DataPayload, SubscriberConfig, SubscriberHooks};
use super::cycle::detect_cycle;
use super::entry::{RegistryEntry, RegistrySnapshot, ReleasedEntry};
use super::teardown::Teardown;
use crate::backend::{
    Backend, BackendFailure, BackendHandle, ErrorCallback, EventType, ListenerToken,
};
use crate::descriptor::{Mode, SubscriptionDescriptor, ROOT_KEY};
use crate::error::{Result, SubscriberError};
use crate::ledger::{join_readiness, Deferred, Readiness, ReadinessLedger};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace};

/// Mutable registry state. Only touched in short sections that never
/// call out of the registry.
struct RegistryState {
    entries: HashMap<String, RegistryEntry>,
    ledger: ReadinessLedger,
    next_generation: u64,
}

struct Inner {
    backend: Arc<dyn Backend>,
    config: SubscriberConfig,
    hooks: SubscriberHooks,
    state: Mutex<RegistryState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let entries = std::mem::take(&mut state.entries);
        let ledger = std::mem::take(&mut state.ledger);
        if !entries.is_empty() {
            debug!(entries = entries.len(), "registry dropped, releasing listeners");
        }
        // Nested teardowns can no longer reach the registry; every entry
        // is released here instead.
        for entry in entries.into_values() {
            entry.release().stop_listeners();
        }
        drop(ledger);
    }
}

/// Which teardown map of an entry a nested subscription belongs to.
#[derive(Clone, Copy)]
enum Slot {
    Child,
    Field,
}

enum Release {
    Missing,
    Kept,
    Destroyed(ReleasedEntry, Option<Deferred>),
}

/// Result of subscribing with readiness.
#[must_use = "the teardown must eventually run to release the subscriptions"]
pub struct Subscribed {
    pub teardown: Teardown,
    /// Resolves with every key once all are loaded; the first rejection wins.
    pub readiness: BoxFuture<'static, Result<Vec<String>>>,
}

impl fmt::Debug for Subscribed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribed")
            .field("teardown", &self.teardown)
            .finish_non_exhaustive()
    }
}

/// Callback context for one incarnation of a key.
#[derive(Clone)]
struct Binding {
    registry: Weak<Inner>,
    key: String,
    generation: u64,
}

impl Binding {
    fn registry(&self) -> Option<Registry> {
        self.registry.upgrade().map(|inner| Registry { inner })
    }

    fn error_callback(&self) -> ErrorCallback {
        let binding = self.clone();
        Arc::new(move |failure| {
            if let Some(registry) = binding.registry() {
                registry.on_backend_error(&binding.key, binding.generation, failure);
            }
        })
    }
}

/// Deduplicated, ref-counted set of live subscriptions.
///
/// Cheap to clone; clones share state. Backend callbacks only hold weak
/// references, so dropping the last clone stops all processing and
/// releases every backend listener still attached.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Create a registry with default config and no hooks.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_config(backend, SubscriberConfig::default(), SubscriberHooks::default())
    }

    /// Create a registry with explicit config and hooks.
    pub fn with_config(
        backend: Arc<dyn Backend>,
        config: SubscriberConfig,
        hooks: SubscriberHooks,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                hooks,
                state: Mutex::new(RegistryState {
                    entries: HashMap::new(),
                    ledger: ReadinessLedger::new(),
                    next_generation: 1,
                }),
            }),
        }
    }

    /// Config this registry was built with.
    pub fn config(&self) -> &SubscriberConfig {
        &self.inner.config
    }

    // --- Subscribing ---

    /// Subscribe from outside the registry (parent `_root`).
    pub fn subscribe(&self, descriptor: SubscriptionDescriptor) -> Teardown {
        self.subscribe_from(descriptor, ROOT_KEY)
    }

    /// Subscribe on behalf of `parent_key`.
    pub fn subscribe_from(&self, descriptor: SubscriptionDescriptor, parent_key: &str) -> Teardown {
        self.subscribe_one(descriptor, parent_key).0
    }

    /// Subscribe several descriptors from outside the registry.
    pub fn subscribe_many(&self, descriptors: Vec<SubscriptionDescriptor>) -> Teardown {
        self.subscribe_many_from(descriptors, ROOT_KEY)
    }

    /// Subscribe each descriptor; the returned teardown releases all of them.
    pub fn subscribe_many_from(
        &self,
        descriptors: Vec<SubscriptionDescriptor>,
        parent_key: &str,
    ) -> Teardown {
        self.subscribe_all(descriptors, parent_key).0
    }

    /// Subscribe several descriptors from outside the registry, with a
    /// joint readiness future.
    pub fn subscribe_many_with_readiness(
        &self,
        descriptors: Vec<SubscriptionDescriptor>,
    ) -> Subscribed {
        self.subscribe_many_with_readiness_from(descriptors, ROOT_KEY)
    }

    /// Subscribe several descriptors on behalf of `parent_key`, with a
    /// joint readiness future.
    pub fn subscribe_many_with_readiness_from(
        &self,
        descriptors: Vec<SubscriptionDescriptor>,
        parent_key: &str,
    ) -> Subscribed {
        let (teardown, readiness) = self.subscribe_all(descriptors, parent_key);
        Subscribed {
            teardown,
            readiness: join_readiness(readiness),
        }
    }

    // --- Unsubscribing ---

    /// Release one reference to `key` held through `parent_key`.
    ///
    /// The last release removes the entry first, then stops its
    /// listeners, runs its nested teardowns and drops its readiness.
    pub fn unsubscribe(&self, key: &str, parent_key: &str) {
        let exists = self.inner.state.lock().entries.contains_key(key);
        if exists {
            if let Some(hook) = &self.inner.hooks.on_will_unsubscribe {
                hook(self, key);
            }
        }

        let release = {
            let mut state = self.inner.state.lock();
            let destroyed = match state.entries.get_mut(key) {
                None => None,
                Some(entry) => Some(entry.release_ref(parent_key)),
            };
            match destroyed {
                None => Release::Missing,
                Some(false) => Release::Kept,
                Some(true) => match state.entries.remove(key) {
                    Some(entry) => Release::Destroyed(entry.release(), state.ledger.remove(key)),
                    None => Release::Missing,
                },
            }
        };

        match release {
            Release::Missing => self.report(SubscriberError::Consistency(format!(
                "no subscription found for key {key}"
            ))),
            Release::Kept => {
                trace!(key = %key, parent = %parent_key, "subscription reference released");
            }
            Release::Destroyed(released, deferred) => {
                debug!(key = %key, "subscription destroyed");
                drop(deferred);
                released.run();
                self.settle();
            }
        }

        if let Some(hook) = &self.inner.hooks.on_unsubscribed {
            hook(self, key);
        }
    }

    /// Release every reference taken from outside the registry.
    pub fn unsubscribe_all(&self) {
        let mut roots: Vec<(String, usize)> = {
            let state = self.inner.state.lock();
            state
                .entries
                .iter()
                .filter(|(_, entry)| entry.root_refs() > 0)
                .map(|(key, entry)| (key.clone(), entry.root_refs()))
                .collect()
        };
        roots.sort();

        for (key, count) in roots {
            for _ in 0..count {
                // A hook may already have released it.
                if self.root_refs(&key) == 0 {
                    break;
                }
                self.unsubscribe(&key, ROOT_KEY);
            }
        }
    }

    // --- Readiness & inspection ---

    /// Readiness future for `key`, created if nobody asked before.
    ///
    /// Futures for keys that were never subscribed are kept only while
    /// someone still holds one.
    pub fn loaded_promise(&self, key: &str) -> Readiness {
        let (readiness, unobserved) = {
            let mut state = self.inner.state.lock();
            let RegistryState {
                entries, ledger, ..
            } = &mut *state;
            let unobserved = ledger.prune_unobserved(|k| entries.contains_key(k));
            (ledger.loaded(key), unobserved)
        };
        drop(unobserved);
        readiness
    }

    /// Copy of every entry, for inspection and diagnostics.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.inner.state.lock();
        RegistrySnapshot {
            entries: state
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.snapshot()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    /// True when no key is live.
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().entries.is_empty()
    }

    /// Whether `key` is currently live.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.state.lock().entries.contains_key(key)
    }

    /// Total references held on `key`, across all parents.
    pub fn ref_count(&self, key: &str) -> Option<usize> {
        self.inner.state.lock().entries.get(key).map(|e| e.ref_count)
    }

    fn root_refs(&self, key: &str) -> usize {
        self.inner
            .state
            .lock()
            .entries
            .get(key)
            .map(RegistryEntry::root_refs)
            .unwrap_or(0)
    }

    // --- Internal: subscribe path ---

    fn subscribe_all(
        &self,
        descriptors: Vec<SubscriptionDescriptor>,
        parent_key: &str,
    ) -> (Teardown, Vec<Readiness>) {
        let (teardowns, readiness): (Vec<_>, Vec<_>) = descriptors
            .into_iter()
            .map(|descriptor| self.subscribe_one(descriptor, parent_key))
            .unzip();
        (Teardown::merge(teardowns), readiness)
    }

    fn subscribe_one(
        &self,
        descriptor: SubscriptionDescriptor,
        parent_key: &str,
    ) -> (Teardown, Readiness) {
        if let Err(err) = descriptor.validate() {
            self.report(err.clone());
            return (Teardown::noop(), future::ready(Err(err)).boxed().shared());
        }

        if let Some(hook) = &self.inner.hooks.on_will_subscribe {
            hook(self, &descriptor);
        }

        let key = descriptor.key.clone();
        let (readiness, created) = {
            let mut state = self.inner.state.lock();
            let readiness = state.ledger.loaded(&key);
            match state.entries.get_mut(&key) {
                Some(entry) => {
                    entry.add_ref(parent_key);
                    (readiness, None)
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    state.entries.insert(
                        key.clone(),
                        RegistryEntry::new(descriptor.clone(), generation, parent_key),
                    );
                    (readiness, Some(generation))
                }
            }
        };

        self.check_cycle(&key);

        match created {
            Some(generation) => {
                debug!(key = %key, mode = ?descriptor.mode, parent = %parent_key, "subscription created");
                self.attach(&descriptor, generation);
            }
            None => {
                trace!(key = %key, parent = %parent_key, "subscription reference added");
            }
        }

        if let Some(hook) = &self.inner.hooks.on_subscribed {
            hook(self, &descriptor);
        }

        (self.teardown_for(&key, parent_key), readiness)
    }

    fn teardown_for(&self, key: &str, parent_key: &str) -> Teardown {
        let registry = Arc::downgrade(&self.inner);
        let key = key.to_string();
        let parent_key = parent_key.to_string();
        Teardown::new(move || {
            if let Some(inner) = registry.upgrade() {
                Registry { inner }.unsubscribe(&key, &parent_key);
            }
        })
    }

    /// Resolve the backend handle and start mode-specific listeners.
    fn attach(&self, descriptor: &SubscriptionDescriptor, generation: u64) {
        let key = descriptor.key.as_str();
        let handle = self.inner.backend.resolve(descriptor);
        {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(generation) => entry.handle = Some(Arc::clone(&handle)),
                _ => return,
            }
        }

        let binding = Binding {
            registry: Arc::downgrade(&self.inner),
            key: key.to_string(),
            generation,
        };

        match descriptor.mode {
            Mode::List => {
                // Events are ignored until the initial read lands.
                for event in EventType::LIST_EVENTS {
                    if !self.is_live(key, generation) {
                        return;
                    }
                    let on_event = {
                        let binding = binding.clone();
                        Arc::new(move |child_key: String, value: Value| {
                            if let Some(registry) = binding.registry() {
                                registry.on_list_event(
                                    &binding.key,
                                    binding.generation,
                                    event,
                                    child_key,
                                    value,
                                );
                            }
                        })
                    };
                    let token = handle.on_event(event, on_event, binding.error_callback());
                    self.keep_listener(&handle, key, generation, event, token);
                }

                if !self.is_live(key, generation) {
                    return;
                }
                let on_value = {
                    let binding = binding.clone();
                    Box::new(move |value: Value| {
                        if let Some(registry) = binding.registry() {
                            registry.on_initial_read(&binding.key, binding.generation, value);
                        }
                    })
                };
                handle.read_once(on_value, binding.error_callback());
            }
            Mode::Value => {
                let on_event = {
                    let binding = binding.clone();
                    Arc::new(move |_: String, value: Value| {
                        if let Some(registry) = binding.registry() {
                            registry.on_value(&binding.key, binding.generation, value);
                        }
                    })
                };
                let token = handle.on_event(
                    EventType::ValueChanged,
                    on_event,
                    binding.error_callback(),
                );
                self.keep_listener(&handle, key, generation, EventType::ValueChanged, token);
            }
        }
    }

    /// Track a listener token, or release it if its entry is already gone.
    fn keep_listener(
        &self,
        handle: &Arc<dyn BackendHandle>,
        key: &str,
        generation: u64,
        event: EventType,
        token: ListenerToken,
    ) {
        let kept = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(generation) => {
                    entry.listeners.push((event, token));
                    true
                }
                _ => false,
            }
        };
        if !kept {
            handle.off_event(event, token);
        }
    }

    fn check_cycle(&self, key: &str) {
        if !self.inner.config.detect_cycles {
            return;
        }

        let err = {
            let mut state = self.inner.state.lock();
            let trail = {
                let entries = &state.entries;
                detect_cycle(key, |k: &str| {
                    entries
                        .get(k)
                        .map(|entry| entry.parent_edges.keys().cloned().collect::<Vec<_>>())
                        .unwrap_or_default()
                })
            };
            let Some(trail) = trail else {
                return;
            };
            let err = SubscriberError::Cycle { trail };
            state.ledger.reject(key, err.clone());
            state.ledger.settle_waiting();
            err
        };

        self.report(err);
    }

    // --- Internal: backend continuations ---

    fn on_initial_read(&self, key: &str, generation: u64, value: Value) {
        let descriptor = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(generation) => {
                    if entry.initialized {
                        None
                    } else {
                        entry.initialized = true;
                        Some(entry.descriptor.clone())
                    }
                }
                _ => return,
            }
        };
        let Some(descriptor) = descriptor else {
            self.report(SubscriberError::Consistency(format!(
                "initial read for {key} delivered more than once"
            )));
            return;
        };

        let mut nested = Vec::new();
        if let Value::Object(children) = &value {
            for (child_key, child_value) in children {
                if !self.is_live(key, generation) {
                    break;
                }
                if let Some(replaced) =
                    self.subscribe_child(&descriptor, generation, child_key, child_value, Some(&mut nested))
                {
                    replaced.run();
                }
            }
        }
        for teardown in self.replace_fields(&descriptor, generation, &value, Some(&mut nested)) {
            teardown.run();
        }

        self.notify_data(DataEvent::InitialValue, &descriptor, generation, DataPayload { key: None, value });
        self.await_nested(key, generation, nested);
    }

    fn on_list_event(
        &self,
        key: &str,
        generation: u64,
        event: EventType,
        child_key: String,
        value: Value,
    ) {
        let descriptor = {
            let state = self.inner.state.lock();
            match state.entries.get(key) {
                Some(entry) if entry.is_live(generation) => {
                    if !entry.initialized {
                        trace!(key = %key, event = %event, child = %child_key, "ignoring event before initial read");
                        return;
                    }
                    entry.descriptor.clone()
                }
                _ => return,
            }
        };

        match event {
            EventType::ChildAdded => {
                if let Some(replaced) =
                    self.subscribe_child(&descriptor, generation, &child_key, &value, None)
                {
                    replaced.run();
                }
                let payload = DataPayload { key: Some(child_key), value };
                self.notify_data(DataEvent::ChildAdded, &descriptor, generation, payload);
            }
            EventType::ChildChanged => {
                // New nested subscriptions first, then the ones they replace.
                if let Some(replaced) =
                    self.subscribe_child(&descriptor, generation, &child_key, &value, None)
                {
                    replaced.run();
                }
                let payload = DataPayload { key: Some(child_key), value };
                self.notify_data(DataEvent::ChildWillChange, &descriptor, generation, payload.clone());
                self.notify_data(DataEvent::ChildChanged, &descriptor, generation, payload);
            }
            EventType::ChildRemoved => {
                let removed = {
                    let mut state = self.inner.state.lock();
                    match state.entries.get_mut(key) {
                        Some(entry) if entry.is_live(generation) => {
                            entry.child_teardowns.remove(&child_key)
                        }
                        _ => None,
                    }
                };
                if let Some(teardown) = removed {
                    teardown.run();
                }
                let payload = DataPayload { key: Some(child_key), value };
                self.notify_data(DataEvent::ChildWillRemove, &descriptor, generation, payload.clone());
                self.notify_data(DataEvent::ChildRemoved, &descriptor, generation, payload);
            }
            EventType::ValueChanged => {
                trace!(key = %key, "value event on a list subscription ignored");
            }
        }
    }

    fn on_value(&self, key: &str, generation: u64, value: Value) {
        let (descriptor, first, old_children) = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(generation) => {
                    let first = !entry.initialized;
                    entry.initialized = true;
                    (
                        entry.descriptor.clone(),
                        first,
                        std::mem::take(&mut entry.child_teardowns),
                    )
                }
                _ => return,
            }
        };

        // Subscribe the new value's nested set before releasing the old
        // one, so keys present in both never drop to zero references.
        let mut nested = first.then(Vec::new);
        if let Value::Object(children) = &value {
            for (child_key, child_value) in children {
                if !self.is_live(key, generation) {
                    break;
                }
                if let Some(replaced) =
                    self.subscribe_child(&descriptor, generation, child_key, child_value, nested.as_mut())
                {
                    replaced.run();
                }
            }
        }
        let old_fields = self.replace_fields(&descriptor, generation, &value, nested.as_mut());

        for teardown in old_children.into_values() {
            teardown.run();
        }
        for teardown in old_fields {
            teardown.run();
        }

        self.notify_data(DataEvent::Value, &descriptor, generation, DataPayload { key: None, value });
        if let Some(nested) = nested {
            self.await_nested(key, generation, nested);
        }
    }

    fn on_backend_error(&self, key: &str, generation: u64, failure: BackendFailure) {
        let err = {
            let state = self.inner.state.lock();
            match state.entries.get(key) {
                Some(entry) if entry.is_live(generation) => SubscriberError::Backend {
                    key: key.to_string(),
                    locator: entry.descriptor.locator_label(),
                    code: failure.code_or_unknown().to_string(),
                },
                _ => return,
            }
        };

        self.report(err.clone());

        let mut state = self.inner.state.lock();
        state.ledger.reject(key, err);
        state.ledger.settle_waiting();
    }

    // --- Internal: nested reconciliation ---

    /// Derive and subscribe the nested set for one child.
    ///
    /// Returns the teardown this child previously had, for the caller to
    /// run once the new set is in place.
    fn subscribe_child(
        &self,
        descriptor: &SubscriptionDescriptor,
        generation: u64,
        child_key: &str,
        child_value: &Value,
        nested: Option<&mut Vec<Readiness>>,
    ) -> Option<Teardown> {
        let rule = descriptor.on_each_child.as_ref()?;
        let derived = rule.derive(child_key, child_value);
        let (teardown, readiness) = self.subscribe_all(derived, &descriptor.key);
        self.track(&descriptor.key, generation, Slot::Child, child_key, teardown, readiness, nested)
    }

    /// Subscribe field-derived sets for `value` and hand back the
    /// previous field teardowns.
    fn replace_fields(
        &self,
        descriptor: &SubscriptionDescriptor,
        generation: u64,
        value: &Value,
        mut nested: Option<&mut Vec<Readiness>>,
    ) -> Vec<Teardown> {
        let key = descriptor.key.as_str();
        let old = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(generation) => {
                    std::mem::take(&mut entry.field_teardowns)
                }
                _ => BTreeMap::new(),
            }
        };

        if let Value::Object(fields) = value {
            for rule in &descriptor.on_fields {
                if !self.is_live(key, generation) {
                    break;
                }
                let Some(field_value) = fields.get(rule.field_key()) else {
                    continue;
                };
                let derived = rule.derive(field_value);
                let (teardown, readiness) = self.subscribe_all(derived, key);
                if let Some(replaced) = self.track(
                    key,
                    generation,
                    Slot::Field,
                    rule.field_key(),
                    teardown,
                    readiness,
                    nested.as_deref_mut(),
                ) {
                    replaced.run();
                }
            }
        }

        old.into_values().collect()
    }

    /// Record a nested teardown on its parent, or roll it back if the
    /// parent went away while the nested set was being subscribed.
    #[allow(clippy::too_many_arguments)]
    fn track(
        &self,
        key: &str,
        generation: u64,
        slot: Slot,
        name: &str,
        teardown: Teardown,
        readiness: Vec<Readiness>,
        nested: Option<&mut Vec<Readiness>>,
    ) -> Option<Teardown> {
        let outcome = {
            let mut state = self.inner.state.lock();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(generation) => {
                    let teardowns = match slot {
                        Slot::Child => &mut entry.child_teardowns,
                        Slot::Field => &mut entry.field_teardowns,
                    };
                    Ok(teardowns.insert(name.to_string(), teardown))
                }
                _ => Err(teardown),
            }
        };

        match outcome {
            Ok(replaced) => {
                if let Some(nested) = nested {
                    nested.extend(readiness);
                }
                replaced
            }
            Err(orphaned) => {
                trace!(key = %key, nested = %name, "parent gone, rolling back nested subscriptions");
                orphaned.run();
                None
            }
        }
    }

    fn await_nested(&self, key: &str, generation: u64, nested: Vec<Readiness>) {
        let mut state = self.inner.state.lock();
        let live = matches!(state.entries.get(key), Some(entry) if entry.is_live(generation));
        if live {
            state.ledger.await_nested(key, nested);
            state.ledger.settle_waiting();
        }
    }

    fn settle(&self) {
        self.inner.state.lock().ledger.settle_waiting();
    }

    fn is_live(&self, key: &str, generation: u64) -> bool {
        matches!(
            self.inner.state.lock().entries.get(key),
            Some(entry) if entry.is_live(generation)
        )
    }

    fn notify_data(
        &self,
        event: DataEvent,
        descriptor: &SubscriptionDescriptor,
        generation: u64,
        payload: DataPayload,
    ) {
        let Some(hook) = &self.inner.hooks.on_data else {
            return;
        };
        if self.is_live(&descriptor.key, generation) {
            hook(self, event, &payload, descriptor);
        }
    }

    /// Route an error to the log and the error sink.
    fn report(&self, err: SubscriberError) {
        if self.inner.config.log_errors {
            error!(kind = ?err.kind(), "{err}");
        }
        if let Some(sink) = &self.inner.hooks.on_error {
            sink(&err);
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
