//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (secrets, deployment tier)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is read once per process; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Secrets come from the environment, never from checked-in files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::AppConfig;
pub use schema::DecisionConfig;
pub use schema::ExperimentConfig;
pub use schema::GeoConfig;
pub use schema::IdentityConfig;
pub use schema::ProviderKind;
