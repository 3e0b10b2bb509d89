//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     "/session/:sessionId/url" + HandlerFactory
//!     → template.rs (compile literal/variable segments)
//!     → table.rs (append to the method's RouteTable, attach renderers)
//!
//! Incoming request (method, path):
//!     → RouteTables::for_method
//!     → RouteTable::resolve (first full template match)
//!     → Return: Route + captured PathVariables, or no match
//! ```
//!
//! # Design Decisions
//! - Tables are built once and shared immutably behind an `Arc`
//! - No regex; matching is a segment-by-segment comparison
//! - Deterministic: the same path always resolves to the same route
//! - First match wins (registration order)

pub mod table;
pub mod template;

pub use table::{Route, RouteBuilder, RouteTable, RouteTables};
pub use template::{PathTemplate, PathVariables, TemplateError};
