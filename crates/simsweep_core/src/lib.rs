//! Fault-tolerant parameter sweep harness for long-running simulations
//!
//! This crate drives an external simulation engine through a grid of input
//! parameters and records one row per run in an append-only results log.
//! It provides:
//! - Engine traits for parameters, solver control and metric series
//! - A self-describing results log whose columns are discovered at first use
//! - A run executor that turns every engine failure into a logged outcome
//! - Sweep expansion over ranged, coupled axes
//! - A cancellable countdown between runs
//!
//! # Example
//!
//! ```ignore
//! use simsweep_core::{Harness, SweepSpec};
//!
//! let spec: SweepSpec = load_spec()?;
//! let mut harness = Harness::new(engine);
//! let summary = harness.run(&spec, Path::new("results.csv"))?;
//! println!("{} runs, {} failed", summary.runs, summary.failures);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod engine;
pub mod error;
pub mod executor;
pub mod harness;
pub mod log;
pub mod sweep;
pub mod throttle;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use engine::{
    EngineError, MetricsSource, ParameterStore, ResetFlags, Simulation, SimulationControl,
};
pub use error::{ConfigurationError, LogWriteError};
pub use executor::RunExecutor;
pub use harness::Harness;
pub use log::{ResultLog, ResultRow, RowSchema, discover_schema};
pub use model::{
    MeshStats, MetricCategory, MetricSeries, Parameter, ParameterSet, RunMetrics, RunOutcome,
};
pub use sweep::{Axis, AxisBinding, SweepController, SweepSpec, SweepState, SweepSummary};
pub use throttle::{
    Announcer, CancelToken, MessageSchedule, PauseOutcome, Throttle, TracingAnnouncer,
};
