//! Domain-driven configuration management for Tidemark
//!
//! Configuration is split by functional domain (migrations, store, logging),
//! each with its own defaults and validation. Files are YAML; any value can be
//! overridden through `TIDEMARK_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    logging::{LogFormat, LogLevel, LoggingConfig},
    migrations::{IdentifierPolicy, MigrationsConfig},
    store::{StoreBackend, StoreConfig},
    TidemarkConfig,
};
