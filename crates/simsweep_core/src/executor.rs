//! Single-run execution: configure, mesh, solve, sample.
//!
//! [`RunExecutor::execute`] never fails. Engine errors, runs that complete no
//! iterations and series missing the sampled value all become
//! [`RunOutcome::Failure`] with a sanitised message.

use std::time::{Duration, Instant};

use crate::engine::{EngineError, ResetFlags, Simulation};
use crate::log::sanitize_message;
use crate::model::{MetricCategory, Parameter, ParameterSet, RunMetrics, RunOutcome};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("solver completed no iterations")]
    NoIterations,

    #[error("series '{series}' has no value at iteration {iteration}")]
    MissingSample { series: String, iteration: u64 },
}

/// Drives one configure → mesh → solve cycle against a [`Simulation`].
#[derive(Debug, Clone, Default)]
pub struct RunExecutor {
    reset: ResetFlags,
}

impl RunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reset_flags(mut self, reset: ResetFlags) -> Self {
        self.reset = reset;
        self
    }

    pub fn execute<S: Simulation + ?Sized>(&self, sim: &mut S, params: &ParameterSet) -> RunOutcome {
        tracing::info!("|=====--- {} ---=====|", params.describe());
        match self.try_execute(sim, params) {
            Ok(metrics) => {
                tracing::info!("Running finished");
                RunOutcome::Success(metrics)
            }
            Err(e) => {
                let error = sanitize_message(&e.to_string());
                tracing::warn!("Run failed: {error}");
                RunOutcome::failure(error).with_parameters(parameter_snapshot(sim, params))
            }
        }
    }

    fn try_execute<S: Simulation + ?Sized>(
        &self,
        sim: &mut S,
        params: &ParameterSet,
    ) -> Result<RunMetrics, RunError> {
        apply_parameters(sim, params)?;

        let mesh_time = mesh(sim)?;

        sim.reset_solution(self.reset)?;
        sim.initialize_solution()?;
        sim.run_to_stopping_criterion()?;

        let iterations = sim.current_iteration()?;
        // Series are indexed by completed step, so the last value is at count - 1.
        let index = iterations.checked_sub(1).ok_or(RunError::NoIterations)?;

        Ok(RunMetrics {
            parameters: sim.parameters()?,
            coefficients: sample_series(sim, MetricCategory::Coefficients, index)?,
            reports: sample_series(sim, MetricCategory::Reports, index)?,
            mesh_minutes: mesh_time.as_secs_f64() / 60.0,
            mesh: sim.mesh_stats()?,
            iterations,
            residuals: sample_series(sim, MetricCategory::Residuals, index)?,
        })
    }
}

/// Push every value (and unit, when given) of `params` into the engine.
pub fn apply_parameters<S: Simulation + ?Sized>(
    sim: &mut S,
    params: &ParameterSet,
) -> Result<(), EngineError> {
    for param in params {
        if let Some(unit) = &param.unit {
            sim.set_parameter_unit(&param.name, unit)?;
        }
        sim.set_parameter_value(&param.name, param.value)?;
    }
    Ok(())
}

/// Current engine parameters, or the requested set if the engine cannot
/// report them.
fn parameter_snapshot<S: Simulation + ?Sized>(sim: &S, requested: &ParameterSet) -> Vec<Parameter> {
    match sim.parameters() {
        Ok(parameters) => parameters,
        Err(e) => {
            tracing::warn!("Could not read parameters after failure: {e}");
            requested.iter().cloned().collect()
        }
    }
}

/// Prepare geometry and generate the mesh, returning the wall time of both.
pub fn mesh<S: Simulation + ?Sized>(sim: &mut S) -> Result<Duration, EngineError> {
    let start = Instant::now();
    sim.prepare_geometry()?;
    sim.generate_mesh()?;
    Ok(start.elapsed())
}

fn sample_series<S: Simulation + ?Sized>(
    sim: &S,
    category: MetricCategory,
    index: u64,
) -> Result<Vec<f64>, RunError> {
    sim.metric_series(category)?
        .into_iter()
        .map(|series| {
            series
                .value_at_iteration(index)
                .ok_or(RunError::MissingSample {
                    series: series.name,
                    iteration: index,
                })
        })
        .collect()
}
