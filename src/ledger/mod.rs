//! Readiness promise ledger.
//!
//! One deferred per key, created lazily by whoever asks first (a caller
//! of `loaded_promise` or the registry when it creates the entry).
//! Settlement is synchronous: the registry reports own-data arrival with
//! [`ReadinessLedger::await_nested`] and then calls
//! [`ReadinessLedger::settle_waiting`], which resolves or rejects every
//! deferred whose nested futures have all settled, until nothing moves.

mod deferred;

pub use deferred::Readiness;
pub(crate) use deferred::Deferred;

use crate::error::{Result, SubscriberError};
use deferred::{poll_nested, NestedState};
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use std::collections::HashMap;

/// Per-key readiness deferreds.
#[derive(Default)]
pub struct ReadinessLedger {
    deferreds: HashMap<String, Deferred>,
}

impl ReadinessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The key's readiness future, creating the deferred if needed.
    pub fn loaded(&mut self, key: &str) -> Readiness {
        self.deferreds
            .entry(key.to_string())
            .or_insert_with(|| Deferred::new(key))
            .future()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.deferreds.contains_key(key)
    }

    /// `None` if the ledger holds nothing for `key`.
    pub fn is_settled(&self, key: &str) -> Option<bool> {
        self.deferreds.get(key).map(Deferred::is_settled)
    }

    pub fn len(&self) -> usize {
        self.deferreds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deferreds.is_empty()
    }

    /// Own data for `key` has loaded; it is ready once `nested` all are.
    pub fn await_nested(&mut self, key: &str, nested: Vec<Readiness>) {
        self.deferreds
            .entry(key.to_string())
            .or_insert_with(|| Deferred::new(key))
            .wait_for(nested);
    }

    /// Resolve `key` if still pending.
    pub fn resolve(&mut self, key: &str) -> bool {
        match self.deferreds.get_mut(key) {
            Some(deferred) => deferred.settle(Ok(key.to_string())),
            None => false,
        }
    }

    /// Reject `key` if still pending.
    pub fn reject(&mut self, key: &str, error: SubscriberError) -> bool {
        match self.deferreds.get_mut(key) {
            Some(deferred) => deferred.settle(Err(error)),
            None => false,
        }
    }

    /// Forget `key`. Observers of an unsettled deferred see `Cancelled`
    /// once the returned value is dropped.
    #[must_use = "drop the deferred outside of any registry lock"]
    pub(crate) fn remove(&mut self, key: &str) -> Option<Deferred> {
        self.deferreds.remove(key)
    }

    /// Drop deferreds nobody observes for keys `keep` rejects.
    #[must_use = "drop the deferreds outside of any registry lock"]
    pub(crate) fn prune_unobserved<F>(&mut self, keep: F) -> Vec<Deferred>
    where
        F: Fn(&str) -> bool,
    {
        let unobserved: Vec<String> = self
            .deferreds
            .iter()
            .filter(|(key, deferred)| !keep(key.as_str()) && deferred.observers() == 0)
            .map(|(key, _)| key.clone())
            .collect();
        unobserved
            .iter()
            .filter_map(|key| self.deferreds.remove(key))
            .collect()
    }

    /// Settle every waiting deferred whose nested futures are done.
    ///
    /// Returns the number of deferreds settled.
    pub fn settle_waiting(&mut self) -> usize {
        let mut settled = 0;
        loop {
            let mut progressed = false;
            for (key, deferred) in self.deferreds.iter_mut() {
                if !deferred.is_waiting() {
                    continue;
                }
                let Some(nested) = deferred.nested() else {
                    continue;
                };
                let outcome = match poll_nested(nested) {
                    NestedState::Pending => continue,
                    NestedState::Ready => Ok(key.clone()),
                    NestedState::Failed(e) => Err(e),
                };
                if deferred.settle(outcome) {
                    settled += 1;
                    progressed = true;
                }
            }
            if !progressed {
                return settled;
            }
        }
    }
}

/// Resolve with every key once all futures resolve; the first rejection wins.
pub fn join_readiness(futures: Vec<Readiness>) -> BoxFuture<'static, Result<Vec<String>>> {
    try_join_all(futures).boxed()
}
