use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use simsweep_core::model::format_value;
use simsweep_core::{
    EngineError, MeshStats, MetricCategory, MetricSeries, MetricsSource, Parameter,
    ParameterStore, ResetFlags, SimulationControl,
};

use super::{EngineConfig, Phase, RunResults};

/// Environment variable suffix for a parameter name: upper-cased, anything
/// that is not alphanumeric becomes `_`.
pub fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Drives an external solver through per-phase shell commands.
pub struct CommandEngine {
    config: EngineConfig,
    parameters: Vec<Parameter>,
    max_steps: Option<u64>,
    reset: Option<ResetFlags>,
    results: Option<RunResults>,
}

impl CommandEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            parameters: config.parameters.clone(),
            config,
            max_steps: None,
            reset: None,
            results: None,
        }
    }

    pub fn working_dir(&self) -> &Path {
        self.config
            .working_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
    }

    pub fn results_path(&self) -> PathBuf {
        self.working_dir().join(&self.config.results_file)
    }

    /// Results of the last completed solve, if any
    pub fn results(&self) -> Option<&RunResults> {
        self.results.as_ref()
    }

    /// Variables passed to every phase command
    pub fn environment(&self) -> Vec<(String, String)> {
        let mut env = Vec::with_capacity(self.parameters.len() * 2 + 2);
        for param in &self.parameters {
            let key = env_key(&param.name);
            env.push((format!("SIMSWEEP_PARAM_{key}"), format_value(param.value)));
            if let Some(unit) = &param.unit {
                env.push((format!("SIMSWEEP_UNIT_{key}"), unit.clone()));
            }
        }
        if let Some(steps) = self.max_steps {
            env.push(("SIMSWEEP_MAX_STEPS".to_string(), steps.to_string()));
        }
        if let Some(flags) = self.reset {
            env.push(("SIMSWEEP_RESET".to_string(), flags.labels().join(",")));
        }
        env
    }

    fn run_phase(&self, phase: Phase) -> Result<(), EngineError> {
        let Some(script) = self.config.commands.get(phase) else {
            tracing::debug!("No {} command configured, skipping", phase.label());
            return Ok(());
        };
        tracing::debug!(command = script, "Running {} command", phase.label());

        let output = shell(script)
            .current_dir(self.working_dir())
            .envs(self.environment())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                EngineError::new(format!("failed to start {} command: {e}", phase.label()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("{} stdout: {}", phase.label(), stdout.trim_end());
        }

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("{} command exited with {}", phase.label(), output.status),
            text => text.to_string(),
        };
        Err(EngineError::new(message))
    }

    fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, EngineError> {
        self.parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| EngineError::new(format!("unknown parameter '{name}'")))
    }

    /// Remove results from a previous run so a failed solve cannot be
    /// mistaken for a fresh one.
    fn clear_results(&mut self) -> Result<(), EngineError> {
        self.results = None;
        let path = self.results_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                EngineError::new(format!(
                    "failed to remove stale results file {}: {e}",
                    path.display()
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn shell(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

#[cfg(windows)]
fn shell(script: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}

impl ParameterStore for CommandEngine {
    fn parameters(&self) -> Result<Vec<Parameter>, EngineError> {
        Ok(self.parameters.clone())
    }

    fn set_parameter_value(&mut self, name: &str, value: f64) -> Result<(), EngineError> {
        self.parameter_mut(name)?.value = value;
        Ok(())
    }

    fn set_parameter_unit(&mut self, name: &str, unit: &str) -> Result<(), EngineError> {
        self.parameter_mut(name)?.unit = Some(unit.to_string());
        Ok(())
    }
}

impl SimulationControl for CommandEngine {
    fn set_max_steps(&mut self, steps: u64) -> Result<(), EngineError> {
        if steps == 0 {
            return Err(EngineError::new("max steps must be at least 1"));
        }
        self.max_steps = Some(steps);
        Ok(())
    }

    fn prepare_geometry(&mut self) -> Result<(), EngineError> {
        self.clear_results()?;
        self.run_phase(Phase::Prepare)
    }

    fn generate_mesh(&mut self) -> Result<(), EngineError> {
        self.run_phase(Phase::Mesh)
    }

    fn reset_solution(&mut self, flags: ResetFlags) -> Result<(), EngineError> {
        self.reset = Some(flags);
        self.run_phase(Phase::Reset)
    }

    fn initialize_solution(&mut self) -> Result<(), EngineError> {
        self.run_phase(Phase::Initialize)
    }

    fn run_to_stopping_criterion(&mut self) -> Result<(), EngineError> {
        self.run_phase(Phase::Solve)?;
        self.results = Some(RunResults::load(&self.results_path())?);
        Ok(())
    }

    fn current_iteration(&self) -> Result<u64, EngineError> {
        Ok(self.results.as_ref().map_or(0, |r| r.iterations))
    }

    fn mesh_stats(&self) -> Result<MeshStats, EngineError> {
        Ok(self.results.as_ref().map(|r| r.mesh).unwrap_or_default())
    }
}

impl MetricsSource for CommandEngine {
    /// Declared monitors, filled from the last results file when there is one.
    fn metric_series(&self, category: MetricCategory) -> Result<Vec<MetricSeries>, EngineError> {
        let declared = self.config.monitors.get(category);
        let Some(results) = &self.results else {
            return Ok(declared
                .iter()
                .map(|m| MetricSeries::new(m.name.clone(), m.unit.clone()))
                .collect());
        };

        declared
            .iter()
            .map(|monitor| {
                let record = results.find(category, &monitor.name).ok_or_else(|| {
                    EngineError::new(format!(
                        "{} series '{}' missing from results file",
                        category.label(),
                        monitor.name
                    ))
                })?;
                if let Some(unit) = record.unit.as_deref().filter(|u| *u != monitor.unit) {
                    tracing::warn!(
                        series = %monitor.name,
                        declared = %monitor.unit,
                        reported = unit,
                        "Results file unit differs from the declared monitor; keeping the declared unit"
                    );
                }
                Ok(MetricSeries::new(monitor.name.clone(), monitor.unit.clone())
                    .with_values(record.values.clone()))
            })
            .collect()
    }
}
