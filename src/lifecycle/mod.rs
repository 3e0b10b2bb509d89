//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build route tables → Bind listener
//!     → HubServer::run (starts the session reaper)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop reaper → Release sessions
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routes, then the listener
//! - Route table errors abort startup before anything is bound
//! - Sessions are released only after the listener has drained

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_listener, wait_for_signal};
