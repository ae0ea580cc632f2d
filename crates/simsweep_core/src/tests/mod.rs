//! Integration tests for the sweep harness
//!
//! Tests are organized by topic:
//! - `log` - Results log creation, header freezing and row serialisation
//! - `executor` - Single-run execution and failure classification
//! - `sweep` - Sweep expansion and the controller loop
//! - `harness` - End-to-end sweeps against a scripted engine
//!
//! `fake` holds the scripted engine shared by all of them.

mod fake;
