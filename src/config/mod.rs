//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, endpoint list parse)
//!     → ClusterConfig (validated, immutable)
//!     → Cluster::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the endpoint list never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClusterConfig, ObservabilityConfig, ProbeConfig};
pub use validation::{validate_config, ValidationError};
