//! Single-settlement deferred backing one key's readiness future.

use crate::error::{Result, SubscriberError};
use futures::channel::oneshot;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

/// Future resolving with a subscription's key once its own data and all
/// of its nested subscriptions' data have loaded.
///
/// Cloneable; every clone observes the same outcome.
pub type Readiness = Shared<BoxFuture<'static, Result<String>>>;

/// Where a set of nested readiness futures stands right now.
#[derive(Debug)]
pub(crate) enum NestedState {
    Pending,
    Ready,
    Failed(SubscriberError),
}

/// Inspect nested futures without blocking.
///
/// A nested subscription destroyed before it loaded is no longer part
/// of the graph and counts as satisfied.
pub(crate) fn poll_nested(nested: &[Readiness]) -> NestedState {
    let mut pending = false;
    for future in nested {
        match future.clone().now_or_never() {
            None => pending = true,
            Some(Ok(_)) | Some(Err(SubscriberError::Cancelled(_))) => {}
            Some(Err(e)) => return NestedState::Failed(e),
        }
    }
    if pending {
        NestedState::Pending
    } else {
        NestedState::Ready
    }
}

pub(crate) struct Deferred {
    sender: Option<oneshot::Sender<Result<String>>>,
    future: Readiness,
    /// Nested futures to await once own data has arrived.
    waiting: Option<Vec<Readiness>>,
}

impl Deferred {
    pub(crate) fn new(key: &str) -> Self {
        let (sender, receiver) = oneshot::channel();
        let key = key.to_string();
        let future = receiver
            .map(move |outcome| match outcome {
                Ok(result) => result,
                Err(oneshot::Canceled) => Err(SubscriberError::Cancelled(key)),
            })
            .boxed()
            .shared();

        Self {
            sender: Some(sender),
            future,
            waiting: None,
        }
    }

    pub(crate) fn future(&self) -> Readiness {
        self.future.clone()
    }

    /// Outstanding clones of the future besides the one kept here.
    pub(crate) fn observers(&self) -> usize {
        self.future
            .strong_count()
            .map_or(0, |count| count.saturating_sub(1))
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.sender.is_none()
    }

    pub(crate) fn is_waiting(&self) -> bool {
        !self.is_settled() && self.waiting.is_some()
    }

    pub(crate) fn wait_for(&mut self, nested: Vec<Readiness>) {
        if !self.is_settled() {
            self.waiting = Some(nested);
        }
    }

    pub(crate) fn nested(&self) -> Option<&[Readiness]> {
        self.waiting.as_deref()
    }

    /// Settle once. Returns false if already settled.
    pub(crate) fn settle(&mut self, outcome: Result<String>) -> bool {
        match self.sender.take() {
            Some(sender) => {
                self.waiting = None;
                // The receiver lives inside `self.future`, so it is still around.
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }
}
