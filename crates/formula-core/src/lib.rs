pub mod config;
pub mod context;
pub mod formula;
pub mod observability;

#[doc(hidden)]
pub use tracing;
