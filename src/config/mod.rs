//! Configuration file support.
//!
//! Settings are resolved in three layers: built-in defaults, then the TOML
//! file, then command-line flags (applied by the binary).

/// Configuration error types.
pub mod error;

/// Configuration file loader.
pub mod loader;

/// TOML configuration schema types.
pub mod schema;

/// Configuration path resolution.
pub mod xdg;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::Config;
