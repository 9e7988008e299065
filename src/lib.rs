//! Edge bucket router library.
//!
//! Assigns every visitor of the site root to an experiment bucket, using an
//! external decision service, and redirects or rewrites them to `/<bucket>`.

pub mod config;
pub mod decision;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod pages;
pub mod resilience;
pub mod routing;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
