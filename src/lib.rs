//! # Nested Subscriber
//!
//! A registry of live subscriptions to a hierarchical, event-emitting
//! data backend, where data loaded by one subscription decides which
//! further subscriptions are needed.
//!
//! ## Core Concepts
//!
//! - **Descriptors**: Keyed declarations of what to subscribe to, in List or Value mode
//! - **Registry**: One backend subscription per key, shared and ref-counted by parent
//! - **Nested rules**: Per-child and per-field rules deriving more descriptors from data
//! - **Readiness**: Futures resolving once a subscription and everything below it loaded
//!
//! ## Example
//!
//! ```ignore
//! use nested_subscriber::{ChildRule, Registry, SubscriptionDescriptor};
//!
//! let registry = Registry::new(backend);
//!
//! let friends = SubscriptionDescriptor::list("friends_user1", "friends/user1")
//!     .on_each_child(ChildRule::new(|child_key, _, _| {
//!         vec![SubscriptionDescriptor::value(
//!             format!("userDetail_{child_key}"),
//!             format!("users/{child_key}"),
//!         )]
//!     }));
//!
//! // Subscribe and wait until the list and every user detail loaded
//! let subscribed = registry.subscribe_many_with_readiness(vec![friends]);
//! futures::executor::block_on(subscribed.readiness)?;
//!
//! // Dump the live graph
//! println!("{}", nested_subscriber::diagnostics::as_dot_graph(&registry.snapshot(), None));
//!
//! registry.unsubscribe_all();
//! ```

pub mod backend;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod ledger;
pub mod registry;

// Re-exports
pub use backend::{
    Backend, BackendFailure, BackendHandle, ErrorCallback, EventCallback, EventType,
    ListenerToken, ValueCallback,
};
pub use descriptor::{ChildRule, FieldRule, Mode, SubscriptionDescriptor, ROOT_KEY};
pub use error::{ErrorKind, Result, SubscriberError};
pub use ledger::{join_readiness, Readiness, ReadinessLedger};
pub use registry::{
    detect_cycle, DataEvent, DataPayload, EntrySnapshot, Registry, RegistrySnapshot, Subscribed,
    SubscriberConfig, SubscriberHooks, Teardown,
};
