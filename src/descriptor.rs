//! Subscription descriptors and derivation rules.

use crate::error::{Result, SubscriberError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Parent key recorded for subscriptions made from outside the registry.
///
/// Never itself subscribed, so it has no parent edges and cannot close a
/// cycle.
pub const ROOT_KEY: &str = "_root";

/// Derives nested descriptors for one child: `(child_key, args, child_value)`.
pub type DeriveChildFn =
    dyn Fn(&str, &[Value], &Value) -> Vec<SubscriptionDescriptor> + Send + Sync;

/// Derives nested descriptors for one field: `(field_value, args)`.
pub type DeriveFieldFn = dyn Fn(&Value, &[Value]) -> Vec<SubscriptionDescriptor> + Send + Sync;

/// How the backend data behind a descriptor is tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Keyed collection with incremental add/change/remove events.
    List,
    /// Single value replaced wholesale on each update.
    Value,
}

/// Rule deriving nested subscriptions for every child of a value.
#[derive(Clone)]
pub struct ChildRule {
    derive: Arc<DeriveChildFn>,
    args: Vec<Value>,
}

impl ChildRule {
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn(&str, &[Value], &Value) -> Vec<SubscriptionDescriptor> + Send + Sync + 'static,
    {
        Self {
            derive: Arc::new(derive),
            args: Vec::new(),
        }
    }

    /// Bind extra arguments passed to every derive call.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn derive(&self, child_key: &str, child_value: &Value) -> Vec<SubscriptionDescriptor> {
        (self.derive)(child_key, &self.args, child_value)
    }
}

impl fmt::Debug for ChildRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRule")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Rule deriving nested subscriptions from one named field of an object value.
#[derive(Clone)]
pub struct FieldRule {
    field_key: String,
    derive: Arc<DeriveFieldFn>,
    args: Vec<Value>,
}

impl FieldRule {
    pub fn new<F>(field_key: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Vec<SubscriptionDescriptor> + Send + Sync + 'static,
    {
        Self {
            field_key: field_key.into(),
            derive: Arc::new(derive),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn derive(&self, field_value: &Value) -> Vec<SubscriptionDescriptor> {
        (self.derive)(field_value, &self.args)
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field_key", &self.field_key)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Caller-declared specification of one logical subscription.
///
/// Two descriptors with the same key are the same subscription: the
/// first one to be subscribed decides mode, locator and rules, later ones
/// only add references.
#[derive(Clone, Debug)]
pub struct SubscriptionDescriptor {
    /// Unique, non-empty subscription key.
    pub key: String,
    pub mode: Mode,
    /// Opaque location handed to the backend adapter.
    pub locator: Value,
    pub on_each_child: Option<ChildRule>,
    /// Field rules, applied in order.
    pub on_fields: Vec<FieldRule>,
}

impl SubscriptionDescriptor {
    pub fn new(key: impl Into<String>, mode: Mode, locator: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            mode,
            locator: locator.into(),
            on_each_child: None,
            on_fields: Vec::new(),
        }
    }

    /// Subscribe to a keyed collection.
    pub fn list(key: impl Into<String>, locator: impl Into<Value>) -> Self {
        Self::new(key, Mode::List, locator)
    }

    /// Subscribe to a single value.
    pub fn value(key: impl Into<String>, locator: impl Into<Value>) -> Self {
        Self::new(key, Mode::Value, locator)
    }

    pub fn on_each_child(mut self, rule: ChildRule) -> Self {
        self.on_each_child = Some(rule);
        self
    }

    pub fn on_field(mut self, rule: FieldRule) -> Self {
        self.on_fields.push(rule);
        self
    }

    /// Human-readable locator for error messages, `None` when absent.
    pub fn locator_label(&self) -> Option<String> {
        match &self.locator {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Check the descriptor is well-formed before it touches the registry.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(SubscriberError::Validation(
                "descriptor needs a non-empty key".to_string(),
            ));
        }
        if self.key == ROOT_KEY {
            return Err(SubscriberError::Validation(format!(
                "'{ROOT_KEY}' is reserved and cannot be subscribed"
            )));
        }

        let mut seen = HashSet::new();
        for rule in &self.on_fields {
            if rule.field_key.is_empty() {
                return Err(SubscriberError::Validation(format!(
                    "{}: every field rule needs a non-empty field key",
                    self.key
                )));
            }
            if !seen.insert(rule.field_key.as_str()) {
                return Err(SubscriberError::Validation(format!(
                    "{}: duplicate field rule for '{}'",
                    self.key, rule.field_key
                )));
            }
        }

        Ok(())
    }
}
