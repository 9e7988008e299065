//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the decision service:
//!     → timeouts.rs (enforce a per-operation deadline)
//!     → On failure: caller falls back (fallback bucket, gate off)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries on the request path; the next request tries again
//! - Background flushes are at-most-once

pub mod timeouts;

pub use timeouts::with_deadline;
