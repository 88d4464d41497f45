//! Formula execution runtime.
//!
//! Turns a formula reference into a running process: build on demand
//! (`pre_run`), resolve inputs through a channel (`input`), compose the
//! environment (`environment`) and launch on the host or in a container
//! (`executor`). `Runner` ties the steps together.

pub mod docker;
pub mod environment;
pub mod error;
pub mod executor;
pub mod input;
pub mod pre_run;
pub mod process;
pub mod reconcile;
pub mod report;
pub mod runner;

pub use error::{Result, RunnerError};
pub use executor::Backend;
pub use input::Channel;
pub use runner::Runner;
