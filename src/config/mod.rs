//! Optional settings file.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, resolve, ConfigError, DEFAULT_CONFIG_FILE};
pub use schema::{Settings, ValidationError, ValidationIssue};
