//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Decision service → Static pages → Flush worker → Listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Final event flush → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then collaborators, then listener
//! - Startup never waits on the decision service beyond its deadlines
//! - The decision client lives until the process exits

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build, run, StartupError};
