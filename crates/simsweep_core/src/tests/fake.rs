//! Scripted in-memory engine for harness tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::engine::{
    EngineError, MetricsSource, ParameterStore, ResetFlags, SimulationControl,
};
use crate::model::{MeshStats, MetricCategory, MetricSeries, Parameter};
use crate::throttle::Announcer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prepare,
    Mesh,
    Reset,
    Initialize,
    Solve,
}

/// Engine double. Runs are numbered from 1 and counted at geometry preparation.
///
/// Series value at iteration `i` is `10 * (position + 1) + i`, where position
/// is the series' index within its category.
pub struct FakeSimulation {
    pub parameters: Vec<Parameter>,
    pub series: Vec<(MetricCategory, MetricSeries)>,
    pub iterations: u64,
    pub mesh: MeshStats,
    pub max_steps: Option<u64>,
    pub calls: Vec<String>,
    pub runs: usize,
    failures: HashMap<usize, (Phase, String)>,
    zero_iteration_runs: Vec<usize>,
    truncated_runs: Vec<usize>,
    completed: u64,
}

impl FakeSimulation {
    pub fn new() -> Self {
        Self {
            parameters: vec![
                Parameter::new("Back Offset", 9.0).with_unit("m"),
                Parameter::new("Front Offset", 4.0).with_unit("m"),
                Parameter::new("Side Offset", 2.0).with_unit("m"),
                Parameter::new("Top Offset", 3.0).with_unit("m"),
            ],
            series: vec![
                (
                    MetricCategory::Coefficients,
                    MetricSeries::new("Drag Coefficient Monitor", "none"),
                ),
                (
                    MetricCategory::Reports,
                    MetricSeries::new("Downforce Monitor", "N"),
                ),
                (MetricCategory::Residuals, MetricSeries::new("Continuity", "")),
                (MetricCategory::Residuals, MetricSeries::new("X-momentum", "")),
            ],
            iterations: 100,
            mesh: MeshStats {
                cells: 48_211,
                faces: 130_502,
                vertices: 52_044,
            },
            max_steps: None,
            calls: Vec::new(),
            runs: 0,
            failures: HashMap::new(),
            zero_iteration_runs: Vec::new(),
            truncated_runs: Vec::new(),
            completed: 0,
        }
    }

    /// Make run `run` fail at `phase` with `message`
    pub fn fail_on(mut self, run: usize, phase: Phase, message: &str) -> Self {
        self.failures.insert(run, (phase, message.to_string()));
        self
    }

    /// Make run `run` finish without completing any iteration
    pub fn zero_iterations_on(mut self, run: usize) -> Self {
        self.zero_iteration_runs.push(run);
        self
    }

    /// Make run `run` report series one value short of its iteration count
    pub fn truncate_series_on(mut self, run: usize) -> Self {
        self.truncated_runs.push(run);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    fn step(&mut self, phase: Phase, call: &str) -> Result<(), EngineError> {
        self.calls.push(call.to_string());
        match self.failures.get(&self.runs) {
            Some((failing, message)) if *failing == phase => Err(EngineError::new(message.clone())),
            _ => Ok(()),
        }
    }

    fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, EngineError> {
        self.parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| EngineError::new(format!("unknown parameter '{name}'")))
    }
}

impl ParameterStore for FakeSimulation {
    fn parameters(&self) -> Result<Vec<Parameter>, EngineError> {
        Ok(self.parameters.clone())
    }

    fn set_parameter_value(&mut self, name: &str, value: f64) -> Result<(), EngineError> {
        self.calls.push(format!("set {name}={value}"));
        self.parameter_mut(name)?.value = value;
        Ok(())
    }

    fn set_parameter_unit(&mut self, name: &str, unit: &str) -> Result<(), EngineError> {
        self.parameter_mut(name)?.unit = Some(unit.to_string());
        Ok(())
    }
}

impl SimulationControl for FakeSimulation {
    fn set_max_steps(&mut self, steps: u64) -> Result<(), EngineError> {
        self.max_steps = Some(steps);
        Ok(())
    }

    fn prepare_geometry(&mut self) -> Result<(), EngineError> {
        self.runs += 1;
        self.completed = 0;
        self.step(Phase::Prepare, "prepare")
    }

    fn generate_mesh(&mut self) -> Result<(), EngineError> {
        self.step(Phase::Mesh, "mesh")
    }

    fn reset_solution(&mut self, flags: ResetFlags) -> Result<(), EngineError> {
        let call = format!("reset {}", flags.labels().join("+"));
        self.step(Phase::Reset, &call)
    }

    fn initialize_solution(&mut self) -> Result<(), EngineError> {
        self.step(Phase::Initialize, "initialize")
    }

    fn run_to_stopping_criterion(&mut self) -> Result<(), EngineError> {
        self.step(Phase::Solve, "solve")?;
        self.completed = if self.zero_iteration_runs.contains(&self.runs) {
            0
        } else {
            self.max_steps.unwrap_or(self.iterations).min(self.iterations)
        };
        Ok(())
    }

    fn current_iteration(&self) -> Result<u64, EngineError> {
        Ok(self.completed)
    }

    fn mesh_stats(&self) -> Result<MeshStats, EngineError> {
        Ok(self.mesh)
    }
}

impl MetricsSource for FakeSimulation {
    fn metric_series(&self, category: MetricCategory) -> Result<Vec<MetricSeries>, EngineError> {
        let len = if self.truncated_runs.contains(&self.runs) {
            self.completed.saturating_sub(1)
        } else {
            self.completed
        };
        Ok(self
            .series
            .iter()
            .filter(|(c, _)| *c == category)
            .enumerate()
            .map(|(position, (_, series))| {
                let values = (0..len)
                    .map(|i| 10.0 * (position as f64 + 1.0) + i as f64)
                    .collect();
                series.clone().with_values(values)
            })
            .collect())
    }
}

/// Announcer whose messages stay readable after it is boxed into a controller.
#[derive(Clone, Default)]
pub struct SharedAnnouncer(pub Arc<Mutex<Vec<String>>>);

impl SharedAnnouncer {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Announcer for SharedAnnouncer {
    fn announce(&mut self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}
