//! Session management subsystem.
//!
//! # Data Flow
//! ```text
//! POST /session → SessionRegistry::create → DriverFactory::launch
//!     → Session (id, capabilities, last access, driver slot)
//!
//! Every session-scoped command:
//!     SessionRegistry::get_and_touch → Session::lock_driver → handler
//!
//! SessionReaper (every period):
//!     SessionRegistry::expire_inactive → Session::release → Driver::quit
//! ```
//!
//! # Design Decisions
//! - State is in-memory only; nothing survives a restart
//! - The driver slot's async mutex is the per-session command lock
//! - Release takes the driver out of its slot so `quit` runs once

pub mod reaper;
pub mod registry;
pub mod state;

pub use reaper::SessionReaper;
pub use registry::{SessionError, SessionRegistry};
pub use state::{DriverSlot, Session};
