//! Command handler contract.
//!
//! # Data Flow
//! ```text
//! matched Route
//!     → HandlerFactory (path variables + JSON parameters → Handler)
//!     → Handler::execute(CommandContext)
//!     → Ok(value)          → Outcome::Success, envelope stored as `response`
//!     → Err(CommandError)  → Outcome::Error / Outcome::Exception, stored as `exception`
//! ```
//!
//! # Design Decisions
//! - Handlers never see HTTP; they see a session, parameters and attributes
//! - The outcome is a logical tag, independent of status code and content type
//! - Driver-scoped handlers run with the session's driver lock held

pub mod error;
pub mod handler;
pub mod response;

use std::fmt;

pub use error::{CommandError, Failure};
pub use handler::{Command, CommandContext, Handler, HandlerFactory, Invocation, Scope, Services};
pub use response::CommandResponse;

/// Logical result of running a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The command ran and produced a value.
    Success,
    /// The client asked for something that cannot be done.
    Error,
    /// The command failed unexpectedly.
    Exception,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Success, Outcome::Error, Outcome::Exception];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
            Outcome::Exception => "exception",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
