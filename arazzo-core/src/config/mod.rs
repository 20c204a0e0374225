pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_overrides, load, load_from_env, load_from_file};
pub use schema::{CacheConfig, DiagnosticsConfig, DiscoveryConfig, ServiceConfig};
pub use validation::validate_config;
