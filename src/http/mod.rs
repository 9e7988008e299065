//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID assigned and echoed)
//!     → /        → routing (redirect or rewrite)
//!     → /reset   → expire identity, log event
//!     → /healthz → liveness
//!     → other    → pages
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
