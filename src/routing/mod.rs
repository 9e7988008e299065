//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (cookie, geo/ip headers, uri)
//!     → signals.rs (extract request signals)
//!     → identity (reuse or mint visitor id)
//!     → router.rs (decision context → gateway → assignment)
//!     → outcome.rs (redirect or rewrite to /<bucket>, identity cookie)
//! ```
//!
//! # Design Decisions
//! - Gate on: 302 redirect; gate off: internal rewrite. No third outcome
//! - Only the path changes; the query string is carried over
//! - Deterministic for a given assignment: same input, same outcome

pub mod outcome;
pub mod router;
pub mod signals;

pub use outcome::{decide, target_uri, RouteAction, RoutingOutcome};
pub use router::BucketRouter;
pub use signals::RequestSignals;
