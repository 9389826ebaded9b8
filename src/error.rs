//! Error types for the nested subscriber.

use thiserror::Error;

/// Main error type reported through the error sink and carried by
/// readiness futures.
///
/// Cloneable because a single rejection is observed by every holder of
/// the same readiness future.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubscriberError {
    #[error("Invalid descriptor: {0}")]
    Validation(String),

    #[error("Inconsistent registry state: {0}")]
    Consistency(String),

    #[error("Cycle detected: {}", .trail.join("<-"))]
    Cycle { trail: Vec<String> },

    #[error("{key} {}Backend error: {code}", locator_prefix(.locator))]
    Backend {
        key: String,
        locator: Option<String>,
        code: String,
    },

    #[error("Subscription cancelled before it loaded: {0}")]
    Cancelled(String),
}

fn locator_prefix(locator: &Option<String>) -> String {
    match locator {
        Some(locator) => format!("{locator} "),
        None => String::new(),
    }
}

/// Coarse classification of a [`SubscriberError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Consistency,
    Cycle,
    Backend,
    Cancelled,
}

impl SubscriberError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubscriberError::Validation(_) => ErrorKind::Validation,
            SubscriberError::Consistency(_) => ErrorKind::Consistency,
            SubscriberError::Cycle { .. } => ErrorKind::Cycle,
            SubscriberError::Backend { .. } => ErrorKind::Backend,
            SubscriberError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Keys of a detected cycle, starting and ending with the same key.
    pub fn cycle_trail(&self) -> Option<&[String]> {
        match self {
            SubscriberError::Cycle { trail } => Some(trail),
            _ => None,
        }
    }
}

/// Result type for subscriber operations.
pub type Result<T> = std::result::Result<T, SubscriberError>;
