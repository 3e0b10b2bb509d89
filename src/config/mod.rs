//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HubConfig (validated, immutable)
//!     → command line overrides applied by the binary
//!     → handed to HubServer at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    HubConfig, ListenerConfig, LogFormat, ObservabilityConfig, ResourceConfig, SessionConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError, MAX_SESSION_TIMEOUT_SECS};
