//! Registry configuration and application hooks.

use super::manager::Registry;
use crate::descriptor::SubscriptionDescriptor;
use crate::error::SubscriberError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Registry configuration.
#[derive(Clone, Debug)]
pub struct SubscriberConfig {
    /// Run cycle detection whenever an edge is added.
    /// Default: true
    pub detect_cycles: bool,

    /// Also log every reported error through `tracing`.
    /// Default: true
    pub log_errors: bool,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            log_errors: true,
        }
    }
}

/// Kind of data notification passed to [`SubscriberHooks::on_data`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataEvent {
    /// Initial read of a List subscription.
    InitialValue,
    ChildAdded,
    ChildWillChange,
    ChildChanged,
    ChildWillRemove,
    ChildRemoved,
    /// Update of a Value subscription.
    Value,
}

/// Data handed to [`SubscriberHooks::on_data`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataPayload {
    /// Child key for child events, `None` for whole values.
    pub key: Option<String>,
    pub value: Value,
}

pub type ErrorSink = Arc<dyn Fn(&SubscriberError) + Send + Sync>;
pub type DescriptorHook = Arc<dyn Fn(&Registry, &SubscriptionDescriptor) + Send + Sync>;
pub type KeyHook = Arc<dyn Fn(&Registry, &str) + Send + Sync>;
pub type DataHook =
    Arc<dyn Fn(&Registry, DataEvent, &DataPayload, &SubscriptionDescriptor) + Send + Sync>;

/// Optional callbacks into application code.
///
/// Every hook except `on_error` receives the registry and may call back
/// into it, including unsubscribing the subscription being processed.
#[derive(Clone, Default)]
pub struct SubscriberHooks {
    /// Error sink. Every report lands here.
    pub on_error: Option<ErrorSink>,
    pub on_will_subscribe: Option<DescriptorHook>,
    pub on_subscribed: Option<DescriptorHook>,
    pub on_will_unsubscribe: Option<KeyHook>,
    pub on_unsubscribed: Option<KeyHook>,
    pub on_data: Option<DataHook>,
}

impl SubscriberHooks {
    pub fn on_error(mut self, f: impl Fn(&SubscriberError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_will_subscribe(
        mut self,
        f: impl Fn(&Registry, &SubscriptionDescriptor) + Send + Sync + 'static,
    ) -> Self {
        self.on_will_subscribe = Some(Arc::new(f));
        self
    }

    pub fn on_subscribed(
        mut self,
        f: impl Fn(&Registry, &SubscriptionDescriptor) + Send + Sync + 'static,
    ) -> Self {
        self.on_subscribed = Some(Arc::new(f));
        self
    }

    pub fn on_will_unsubscribe(mut self, f: impl Fn(&Registry, &str) + Send + Sync + 'static) -> Self {
        self.on_will_unsubscribe = Some(Arc::new(f));
        self
    }

    pub fn on_unsubscribed(mut self, f: impl Fn(&Registry, &str) + Send + Sync + 'static) -> Self {
        self.on_unsubscribed = Some(Arc::new(f));
        self
    }

    pub fn on_data(
        mut self,
        f: impl Fn(&Registry, DataEvent, &DataPayload, &SubscriptionDescriptor)
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.on_data = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for SubscriberHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHooks")
            .field("on_error", &self.on_error.is_some())
            .field("on_will_subscribe", &self.on_will_subscribe.is_some())
            .field("on_subscribed", &self.on_subscribed.is_some())
            .field("on_will_unsubscribe", &self.on_will_unsubscribe.is_some())
            .field("on_unsubscribed", &self.on_unsubscribed.is_some())
            .field("on_data", &self.on_data.is_some())
            .finish()
    }
}
