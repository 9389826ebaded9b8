//! Backend adapter interface.
//!
//! The registry never talks to a concrete data store. It asks a
//! [`Backend`] to resolve each descriptor into a [`BackendHandle`] and
//! drives everything else through one-shot reads and typed listeners on
//! that handle. Callbacks may fire on any later turn, or synchronously
//! from inside the registering call; the registry copes with both.

use crate::descriptor::SubscriptionDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Event types a handle can be listened to for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Whole value replaced (Value mode).
    ValueChanged,
    ChildAdded,
    ChildChanged,
    ChildRemoved,
}

impl EventType {
    /// Listeners attached for List mode.
    pub const LIST_EVENTS: [EventType; 3] = [
        EventType::ChildAdded,
        EventType::ChildChanged,
        EventType::ChildRemoved,
    ];
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::ValueChanged => "value_changed",
            EventType::ChildAdded => "child_added",
            EventType::ChildChanged => "child_changed",
            EventType::ChildRemoved => "child_removed",
        };
        f.write_str(name)
    }
}

/// Token returned by [`BackendHandle::on_event`], released with
/// [`BackendHandle::off_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerToken(pub u64);

/// Error surfaced by the backend for a read or listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendFailure {
    /// Backend error code, if the backend supplied one.
    pub code: Option<String>,
}

impl BackendFailure {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
        }
    }

    pub fn unknown() -> Self {
        Self { code: None }
    }

    pub fn code_or_unknown(&self) -> &str {
        self.code.as_deref().unwrap_or("unknown error")
    }
}

/// Receives the value of a one-shot read.
pub type ValueCallback = Box<dyn FnOnce(Value) + Send>;

/// Receives `(child_key, value)` for listener events. For
/// [`EventType::ValueChanged`] the key is the location's own key.
pub type EventCallback = Arc<dyn Fn(String, Value) + Send + Sync>;

/// Receives backend failures for a read or listener.
pub type ErrorCallback = Arc<dyn Fn(BackendFailure) + Send + Sync>;

/// Resolves descriptors to live handles.
pub trait Backend: Send + Sync {
    fn resolve(&self, descriptor: &SubscriptionDescriptor) -> Arc<dyn BackendHandle>;
}

/// A resolved location offering reads and typed listeners.
pub trait BackendHandle: Send + Sync {
    /// Read the current value once.
    fn read_once(&self, on_value: ValueCallback, on_error: ErrorCallback);

    /// Start listening for `event`.
    fn on_event(
        &self,
        event: EventType,
        on_event: EventCallback,
        on_error: ErrorCallback,
    ) -> ListenerToken;

    /// Stop a listener started with [`BackendHandle::on_event`].
    fn off_event(&self, event: EventType, token: ListenerToken);
}

impl<F> Backend for F
where
    F: Fn(&SubscriptionDescriptor) -> Arc<dyn BackendHandle> + Send + Sync,
{
    fn resolve(&self, descriptor: &SubscriptionDescriptor) -> Arc<dyn BackendHandle> {
        self(descriptor)
    }
}
