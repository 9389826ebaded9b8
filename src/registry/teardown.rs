//! Teardown closures returned by subscribe calls.

use std::fmt;

/// Releases the reference taken by one subscribe call.
///
/// Consumed by [`Teardown::run`], so a teardown can only run once.
/// Dropping it without running leaves the subscription active.
#[must_use = "dropping a Teardown without running it keeps the subscription alive"]
pub struct Teardown {
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl Teardown {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// A teardown with nothing to release.
    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Combine teardowns into one that runs each of them once.
    pub fn merge(teardowns: Vec<Teardown>) -> Self {
        let teardowns: Vec<Teardown> = teardowns.into_iter().filter(|t| !t.is_noop()).collect();
        if teardowns.is_empty() {
            return Self::noop();
        }
        Self::new(move || {
            for teardown in teardowns {
                teardown.run();
            }
        })
    }

    pub fn is_noop(&self) -> bool {
        self.action.is_none()
    }

    pub fn run(self) {
        if let Some(action) = self.action {
            action();
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("noop", &self.is_noop())
            .finish()
    }
}
