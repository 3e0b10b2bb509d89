//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all route)
//!     → request.rs (buffered request behind the HttpRequest trait)
//!     → dispatcher.rs
//!         → jsonp.rs (GET /jsonp rewritten into the tunneled request)
//!         → routes.rs tables (method → template → handler factory)
//!         → handler runs against its session
//!         → renderer chosen by outcome + Accept
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Axum only hosts the connection; command routing is the hub's own
//!   template tables, so precedence stays under our control
//! - CORS is unconditional when `Origin` is present; it is not a security
//!   boundary

pub mod dispatcher;
pub mod jsonp;
pub mod request;
pub mod routes;
pub mod server;

pub use dispatcher::Dispatcher;
pub use jsonp::{JsonpRequest, TunnelError};
pub use request::{HttpRequest, IncomingRequest};
pub use routes::build_route_tables;
pub use server::HubServer;
