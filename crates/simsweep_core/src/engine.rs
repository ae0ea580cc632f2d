//! Interfaces to the external simulation engine.
//!
//! The harness never sees the engine itself, only three narrow capabilities:
//! - [`ParameterStore`]: key/value inputs with unit metadata
//! - [`SimulationControl`]: geometry, meshing and solver steps
//! - [`MetricsSource`]: named result series grouped by [`MetricCategory`]
//!
//! [`Simulation`] bundles all three and is implemented for any type that
//! provides them.

use crate::model::{MeshStats, MetricCategory, MetricSeries, Parameter};

/// Failure reported by the engine for any operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a solution reset clears before the next run is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetFlags {
    pub history: bool,
    pub fields: bool,
    pub transient: bool,
}

impl ResetFlags {
    pub const ALL: ResetFlags = ResetFlags {
        history: true,
        fields: true,
        transient: true,
    };

    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.history {
            labels.push("history");
        }
        if self.fields {
            labels.push("fields");
        }
        if self.transient {
            labels.push("transient");
        }
        labels
    }
}

impl Default for ResetFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Key/value access to the simulation's scalar inputs.
pub trait ParameterStore {
    /// Every parameter the engine exposes, in its own order
    fn parameters(&self) -> Result<Vec<Parameter>, EngineError>;

    fn set_parameter_value(&mut self, name: &str, value: f64) -> Result<(), EngineError>;

    fn set_parameter_unit(&mut self, name: &str, unit: &str) -> Result<(), EngineError>;
}

/// Solver lifecycle. Every step may fail.
pub trait SimulationControl {
    /// Configure the step-count stopping criterion
    fn set_max_steps(&mut self, steps: u64) -> Result<(), EngineError>;

    /// Destructive geometry preparation (boolean operations and the like)
    fn prepare_geometry(&mut self) -> Result<(), EngineError>;

    fn generate_mesh(&mut self) -> Result<(), EngineError>;

    fn reset_solution(&mut self, flags: ResetFlags) -> Result<(), EngineError>;

    fn initialize_solution(&mut self) -> Result<(), EngineError>;

    /// Iterate until the configured stopping criterion fires
    fn run_to_stopping_criterion(&mut self) -> Result<(), EngineError>;

    /// Number of completed iterations of the current solution
    fn current_iteration(&self) -> Result<u64, EngineError>;

    fn mesh_stats(&self) -> Result<MeshStats, EngineError>;
}

/// Enumeration of result series.
pub trait MetricsSource {
    /// Series available in `category`. Before the first run the values may be
    /// empty; names and units must already be final.
    fn metric_series(&self, category: MetricCategory) -> Result<Vec<MetricSeries>, EngineError>;
}

/// A complete engine as seen by the harness.
pub trait Simulation: ParameterStore + SimulationControl + MetricsSource {}

impl<T: ParameterStore + SimulationControl + MetricsSource + ?Sized> Simulation for T {}
