//! Command failures and their wire status codes.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::Outcome;

/// Errors raised while building or executing a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The session id is unknown or the session was already released.
    #[error("Session [{0}] not available and is not among the last 1000 terminated sessions")]
    NoSuchSession(String),

    #[error("Unable to locate element: {0}")]
    NoSuchElement(String),

    #[error("Unable to locate window: {0}")]
    NoSuchWindow(String),

    /// The element belonged to a page that has since been replaced.
    #[error("Element is no longer attached to the DOM: {0}")]
    StaleElement(String),

    #[error("JavaScript error: {0}")]
    Javascript(String),

    #[error("Invalid cookie domain: {0}")]
    InvalidCookieDomain(String),

    /// Missing, malformed or mistyped parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Unable to create session: {0}")]
    SessionNotCreated(String),

    /// Unexpected failure inside the driver.
    #[error("{0}")]
    Driver(String),

    /// The handler panicked.
    #[error("Command panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    /// JSON wire protocol status code.
    pub fn status(&self) -> u32 {
        match self {
            CommandError::NoSuchSession(_) => 6,
            CommandError::NoSuchElement(_) => 7,
            CommandError::StaleElement(_) => 10,
            CommandError::Javascript(_) => 17,
            CommandError::NoSuchWindow(_) => 23,
            CommandError::InvalidCookieDomain(_) => 24,
            CommandError::SessionNotCreated(_) => 33,
            CommandError::InvalidArgument(_) => 61,
            CommandError::ResourceNotFound(_)
            | CommandError::Driver(_)
            | CommandError::Panicked(_) => 13,
        }
    }

    /// Short machine-readable kind, reported as `class`.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::NoSuchSession(_) => "NoSuchSession",
            CommandError::NoSuchElement(_) => "NoSuchElement",
            CommandError::NoSuchWindow(_) => "NoSuchWindow",
            CommandError::StaleElement(_) => "StaleElementReference",
            CommandError::Javascript(_) => "JavascriptError",
            CommandError::InvalidCookieDomain(_) => "InvalidCookieDomain",
            CommandError::InvalidArgument(_) => "InvalidArgument",
            CommandError::ResourceNotFound(_) => "ResourceNotFound",
            CommandError::SessionNotCreated(_) => "SessionNotCreated",
            CommandError::Driver(_) => "DriverError",
            CommandError::Panicked(_) => "Panic",
        }
    }

    /// Client mistakes map to `Error`, everything else to `Exception`.
    pub fn outcome(&self) -> Outcome {
        match self {
            CommandError::SessionNotCreated(_)
            | CommandError::Driver(_)
            | CommandError::Panicked(_) => Outcome::Exception,
            _ => Outcome::Error,
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            status: self.status(),
            class: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// A rendered-ready snapshot of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    #[serde(skip)]
    pub status: u32,
    pub class: String,
    pub message: String,
}

impl Failure {
    /// The `value` field of an error envelope.
    pub fn to_value(&self) -> Value {
        json!({
            "message": self.message,
            "class": self.class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(CommandError::NoSuchSession("x".into()).outcome(), Outcome::Error);
        assert_eq!(CommandError::InvalidArgument("url".into()).outcome(), Outcome::Error);
        assert_eq!(CommandError::Driver("boom".into()).outcome(), Outcome::Exception);
        assert_eq!(CommandError::Panicked("boom".into()).outcome(), Outcome::Exception);
    }

    #[test]
    fn test_failure_snapshot() {
        let failure = CommandError::NoSuchElement("#missing".into()).to_failure();
        assert_eq!(failure.status, 7);
        assert_eq!(failure.class, "NoSuchElement");
        assert_eq!(
            failure.to_value(),
            json!({"message": "Unable to locate element: #missing", "class": "NoSuchElement"})
        );
    }
}
