//! Unified configuration layer.
//!
//! Every environment variable the CLI reads goes through this module so that
//! business code works with structured config instead of `std::env::var`.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool`, `.env` loading
//! - `schema`: `PathsConfig`, `RunnerConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants, including the variables emitted to formulas

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, load_dotenv};
pub use schema::{ObservabilityConfig, PathsConfig, RunnerConfig};
