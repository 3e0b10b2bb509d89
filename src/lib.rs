//! Command-dispatch hub for remote browser control.

// Command model and rendering
pub mod command;
pub mod render;
pub mod routing;

// Sessions and the controlled browsers
pub mod driver;
pub mod handlers;
pub mod session;

// Hosting
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::HubConfig;
pub use http::HubServer;
pub use lifecycle::Shutdown;
