//! Integration tests for the command-line harness
//!
//! Tests are organized by topic:
//! - `command_sweep` - Config file to results log through the command engine

#[cfg(unix)]
mod command_sweep;
