//! Nested subscription registry.
//!
//! The registry keeps one backend subscription per key, however many
//! parents ask for it:
//! - Reference counts per parent, torn down at zero
//! - List mode: initial read, then incremental child events
//! - Value mode: full replacement with continuity for unchanged keys
//! - Readiness futures that wait for nested subscriptions
//!
//! # Example
//!
//! ```ignore
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
//! let subscribed = registry.subscribe_many_with_readiness(vec![friends]);
//! futures::executor::block_on(subscribed.readiness)?;
//!
//! // Release everything again
//! subscribed.teardown.run();
//! ```

mod config;
mod cycle;
mod entry;
mod manager;
mod teardown;

pub use config::{
    DataEvent, DataHook, DataPayload, DescriptorHook, ErrorSink, KeyHook, SubscriberConfig,
    SubscriberHooks,
};
pub use cycle::detect_cycle;
pub use entry::{EntrySnapshot, RegistrySnapshot};
pub use manager::{Registry, Subscribed};
pub use teardown::Teardown;
