//! Scripted in-memory backend and fixtures shared by the integration tests.
//!
//! Locators are slash-separated paths into a JSON tree. Nothing is
//! delivered until [`ScriptedBackend::flush`] runs, so tests control
//! exactly when backend callbacks fire.

#![allow(dead_code)]

use nested_subscriber::{
    Backend, BackendFailure, BackendHandle, ChildRule, ErrorCallback, EventCallback, EventType,
    ListenerToken, Registry, SubscriberConfig, SubscriberError, SubscriberHooks,
    SubscriptionDescriptor, ValueCallback,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

type Delivery = Box<dyn FnOnce() + Send>;

struct Listener {
    token: u64,
    event: EventType,
    on_event: EventCallback,
    on_error: ErrorCallback,
}

#[derive(Default)]
struct Script {
    data: Value,
    listeners: HashMap<String, Vec<Listener>>,
    failures: HashMap<String, String>,
    stalled: HashSet<String>,
    resolves: HashMap<String, usize>,
    offs: HashMap<String, usize>,
    pending: VecDeque<Delivery>,
    next_token: u64,
}

impl Script {
    fn value_at(&self, path: &str) -> Value {
        let pointer = if path.is_empty() {
            String::new()
        } else {
            format!("/{path}")
        };
        self.data.pointer(&pointer).cloned().unwrap_or(Value::Null)
    }

    fn listeners_for(&self, path: &str, event: EventType) -> Vec<EventCallback> {
        self.listeners
            .get(path)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|l| l.event == event)
                    .map(|l| Arc::clone(&l.on_event))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn enqueue_event(&mut self, path: &str, event: EventType, key: &str, value: &Value) {
        for on_event in self.listeners_for(path, event) {
            let key = key.to_string();
            let value = value.clone();
            self.pending.push_back(Box::new(move || on_event(key, value)));
        }
    }
}

/// Backend serving a JSON tree, delivering callbacks on `flush`.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new(data: Value) -> Self {
        let backend = Self::default();
        backend.script.lock().data = data;
        backend
    }

    /// Run queued callbacks, including ones queued while flushing.
    pub fn flush(&self) {
        while self.flush_one() {}
    }

    /// Run the next queued callback. Returns false if none was queued.
    pub fn flush_one(&self) -> bool {
        let next = self.script.lock().pending.pop_front();
        match next {
            Some(delivery) => {
                delivery();
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.script.lock().pending.len()
    }

    /// Replace the value at `path` (`Value::Null` removes it) and queue
    /// the events a live backend would emit.
    pub fn set(&self, path: &str, value: Value) {
        let mut script = self.script.lock();
        let old = script.value_at(path);
        set_at(&mut script.data, path, value.clone());

        script.enqueue_event(path, EventType::ValueChanged, last_segment(path), &value);

        if let Some((parent, child_key)) = path.rsplit_once('/') {
            let event = match (old.is_null(), value.is_null()) {
                (true, false) => Some(EventType::ChildAdded),
                (false, true) => Some(EventType::ChildRemoved),
                (false, false) if old != value => Some(EventType::ChildChanged),
                _ => None,
            };
            if let Some(event) = event {
                let payload = if value.is_null() { old } else { value };
                script.enqueue_event(parent, event, child_key, &payload);
            }
        }

        let mut ancestor = path;
        while let Some((parent, _)) = ancestor.rsplit_once('/') {
            let parent_value = script.value_at(parent);
            script.enqueue_event(parent, EventType::ValueChanged, last_segment(parent), &parent_value);
            ancestor = parent;
        }
    }

    pub fn remove(&self, path: &str) {
        self.set(path, Value::Null);
    }

    /// Fail current listeners at `path` and every later read or listen.
    pub fn fail(&self, path: &str, code: &str) {
        let mut script = self.script.lock();
        script.failures.insert(path.to_string(), code.to_string());
        let failing: Vec<ErrorCallback> = script
            .listeners
            .get(path)
            .map(|listeners| listeners.iter().map(|l| Arc::clone(&l.on_error)).collect())
            .unwrap_or_default();
        for on_error in failing {
            let failure = BackendFailure::new(code);
            script.pending.push_back(Box::new(move || on_error(failure)));
        }
    }

    /// Never deliver the current value at `path` to new reads or
    /// listeners. Later changes are still delivered.
    pub fn stall(&self, path: &str) {
        self.script.lock().stalled.insert(path.to_string());
    }

    /// Number of times a descriptor with this locator was resolved.
    pub fn resolve_count(&self, path: &str) -> usize {
        self.script.lock().resolves.get(path).copied().unwrap_or(0)
    }

    /// Number of listeners released at `path`.
    pub fn off_count(&self, path: &str) -> usize {
        self.script.lock().offs.get(path).copied().unwrap_or(0)
    }

    /// Number of listeners currently attached at `path`.
    pub fn listener_count(&self, path: &str) -> usize {
        self.script
            .lock()
            .listeners
            .get(path)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn registry(&self) -> Registry {
        self.registry_with(SubscriberHooks::default())
    }

    pub fn registry_with(&self, hooks: SubscriberHooks) -> Registry {
        Registry::with_config(
            Arc::new(self.clone()),
            SubscriberConfig {
                log_errors: false,
                ..Default::default()
            },
            hooks,
        )
    }
}

impl Backend for ScriptedBackend {
    fn resolve(&self, descriptor: &SubscriptionDescriptor) -> Arc<dyn BackendHandle> {
        let path = descriptor.locator.as_str().unwrap_or_default().to_string();
        *self.script.lock().resolves.entry(path.clone()).or_insert(0) += 1;
        Arc::new(ScriptedHandle {
            path,
            script: Arc::clone(&self.script),
        })
    }
}

struct ScriptedHandle {
    path: String,
    script: Arc<Mutex<Script>>,
}

impl BackendHandle for ScriptedHandle {
    fn read_once(&self, on_value: ValueCallback, on_error: ErrorCallback) {
        let mut script = self.script.lock();
        if let Some(code) = script.failures.get(&self.path).cloned() {
            script
                .pending
                .push_back(Box::new(move || on_error(BackendFailure::new(code))));
            return;
        }
        if script.stalled.contains(&self.path) {
            return;
        }
        let value = script.value_at(&self.path);
        script.pending.push_back(Box::new(move || on_value(value)));
    }

    fn on_event(
        &self,
        event: EventType,
        on_event: EventCallback,
        on_error: ErrorCallback,
    ) -> ListenerToken {
        let mut script = self.script.lock();
        script.next_token += 1;
        let token = script.next_token;

        if let Some(code) = script.failures.get(&self.path).cloned() {
            let on_error = Arc::clone(&on_error);
            script
                .pending
                .push_back(Box::new(move || on_error(BackendFailure::new(code))));
        } else if !script.stalled.contains(&self.path) {
            let current = script.value_at(&self.path);
            match event {
                EventType::ValueChanged => {
                    let key = last_segment(&self.path).to_string();
                    let on_event = Arc::clone(&on_event);
                    script
                        .pending
                        .push_back(Box::new(move || on_event(key, current)));
                }
                // Existing children are replayed as additions.
                EventType::ChildAdded => {
                    if let Value::Object(children) = current {
                        for (key, value) in children {
                            let on_event = Arc::clone(&on_event);
                            script
                                .pending
                                .push_back(Box::new(move || on_event(key, value)));
                        }
                    }
                }
                EventType::ChildChanged | EventType::ChildRemoved => {}
            }
        }

        script
            .listeners
            .entry(self.path.clone())
            .or_default()
            .push(Listener {
                token,
                event,
                on_event,
                on_error,
            });
        ListenerToken(token)
    }

    fn off_event(&self, event: EventType, token: ListenerToken) {
        let mut script = self.script.lock();
        if let Some(listeners) = script.listeners.get_mut(&self.path) {
            listeners.retain(|l| !(l.token == token.0 && l.event == event));
        }
        *script.offs.entry(self.path.clone()).or_insert(0) += 1;
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn set_at(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = json!({});
        }
        node = node
            .as_object_mut()
            .unwrap()
            .entry(segment.to_string())
            .or_insert_with(|| json!({}));
    }
    if !node.is_object() {
        *node = json!({});
    }
    let map = node.as_object_mut().unwrap();
    if value.is_null() {
        map.remove(*last);
    } else {
        map.insert(last.to_string(), value);
    }
}

// --- Fixtures ---

pub fn social_data() -> Value {
    json!({
        "friends": {
            "user1": {"user2": true, "user3": true},
            "user2": {"user1": true},
            "user3": {"user1": true, "user4": true},
            "user4": {"user3": true},
            "user5": {"user4": true}
        },
        "users": {
            "user1": {"first": "Zany", "last": "Dan"},
            "user2": {"first": "Blue", "last": "Man"},
            "user3": {"first": "Lady", "last": "Madonna"}
        },
        "someValue": {
            "someValue": {
                "field1": "user1",
                "field2": {"userKey": "user2", "subField1": "val2", "subField2": "val3"},
                "field3": 0
            }
        }
    })
}

pub fn user_detail(user: &str) -> SubscriptionDescriptor {
    SubscriptionDescriptor::value(format!("userDetail_{user}"), format!("users/{user}"))
}

/// List of a user's friends, with a detail subscription per friend.
pub fn friend_list_with_detail(user: &str) -> SubscriptionDescriptor {
    SubscriptionDescriptor::list(
        format!("friendListWithUserDetail_{user}"),
        format!("friends/{user}"),
    )
    .on_each_child(ChildRule::new(|child_key, _, _| vec![user_detail(child_key)]))
}

/// Friends of friends, recursively. Cyclic for any user with a mutual friend.
pub fn friend_list_with_friend_list(user: &str) -> SubscriptionDescriptor {
    SubscriptionDescriptor::list(
        format!("friendListWithFriendList_{user}"),
        format!("friends/{user}"),
    )
    .on_each_child(ChildRule::new(|child_key, _, _| {
        vec![friend_list_with_friend_list(child_key), user_detail(child_key)]
    }))
}

/// Error sink collecting every report.
pub fn collect_errors() -> (SubscriberHooks, Arc<Mutex<Vec<SubscriberError>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let hooks = SubscriberHooks::default().on_error(move |e| sink.lock().push(e.clone()));
    (hooks, errors)
}
