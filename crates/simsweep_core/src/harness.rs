//! Wires a [`Simulation`], a [`RunExecutor`] and a [`ResultLog`] into one sweep.

use std::path::Path;

use crate::engine::Simulation;
use crate::error::ConfigurationError;
use crate::executor::RunExecutor;
use crate::log::{ResultLog, discover_schema};
use crate::sweep::{SweepController, SweepSpec, SweepSummary};

/// Owns the simulation for the duration of a sweep.
pub struct Harness<S> {
    sim: S,
    executor: RunExecutor,
    controller: SweepController,
}

impl<S: Simulation> Harness<S> {
    pub fn new(sim: S) -> Self {
        Self {
            sim,
            executor: RunExecutor::new(),
            controller: SweepController::new(),
        }
    }

    pub fn with_executor(mut self, executor: RunExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_controller(mut self, controller: SweepController) -> Self {
        self.controller = controller;
        self
    }

    pub fn simulation(&self) -> &S {
        &self.sim
    }

    pub fn controller(&self) -> &SweepController {
        &self.controller
    }

    pub fn into_simulation(self) -> S {
        self.sim
    }

    /// Run `spec` and append its rows to the log at `log_path`.
    ///
    /// Configuration problems (invalid axes, parameters the engine does not
    /// know, a rejected stopping criterion) abort before the first run. A log
    /// that cannot be created is reported and the sweep runs anyway.
    pub fn run(&mut self, spec: &SweepSpec, log_path: &Path) -> Result<SweepSummary, ConfigurationError> {
        let log = match self.prepare(spec, log_path) {
            Ok(log) => log,
            Err(e) => {
                self.controller.abort(&e);
                return Err(e);
            }
        };

        let executor = &self.executor;
        let sim = &mut self.sim;
        self.controller
            .run(spec, |params| executor.execute(sim, params), &log)
    }

    /// Everything that must succeed before the first run
    fn prepare(&mut self, spec: &SweepSpec, log_path: &Path) -> Result<ResultLog, ConfigurationError> {
        spec.validate()?;
        self.check_parameters(spec)?;

        if let Some(steps) = spec.max_steps {
            self.sim.set_max_steps(steps)?;
        }

        self.open_log(log_path)
    }

    fn check_parameters(&self, spec: &SweepSpec) -> Result<(), ConfigurationError> {
        let known = self.sim.parameters()?;
        for name in spec.parameter_names() {
            if !known.iter().any(|p| p.name == name) {
                return Err(ConfigurationError::UnknownParameter(name.to_string()));
            }
        }
        Ok(())
    }

    /// Reuse an existing log's header; discover the schema only for a new log.
    fn open_log(&self, path: &Path) -> Result<ResultLog, ConfigurationError> {
        match ResultLog::open(path) {
            Ok(Some(log)) => {
                tracing::info!("Appending to existing results log {}", path.display());
                return Ok(log);
            }
            Ok(None) => {}
            Err(e) => tracing::error!("{e}"),
        }

        tracing::info!("Writing spreadsheet header");
        let schema = discover_schema(&self.sim)?;
        match ResultLog::ensure_initialized(path, schema.clone()) {
            Ok(log) => Ok(log),
            Err(e) => {
                tracing::error!("{e}; continuing without a results log");
                Ok(ResultLog::detached(path, schema, e.to_string()))
            }
        }
    }
}
