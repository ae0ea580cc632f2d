//! Command-line front end for the simsweep harness
//!
//! This crate wires [`simsweep_core`] to the outside world:
//! - YAML harness configuration
//! - A command-driven engine that runs one shell command per solver phase
//! - File logging with size-based rotation
//! - A read-only report over an existing results log

pub mod config;
pub mod engine;
pub mod inspect;
pub mod logging;

pub use config::{ConfigError, HarnessConfig};
pub use engine::{CommandEngine, EngineConfig};
pub use inspect::LogReport;
pub use logging::init_logging;

#[cfg(test)]
mod tests;
