//! Command-driven simulation engine
//!
//! Each solver phase maps to an optional shell command. Parameters live in an
//! in-memory store and reach the commands as environment variables; the
//! `solve` command leaves a YAML results file that is read back for metrics.
//!
//! ```yaml
//! engine:
//!   working_dir: ./case
//!   commands:
//!     mesh: ./mesh.sh
//!     solve: ./solve.sh
//!   results_file: results.yaml
//!   parameters:
//!     - { name: Back Offset, value: 9.0, unit: m }
//!   monitors:
//!     coefficients:
//!       - { name: Drag Coefficient Monitor, unit: none }
//!     residuals:
//!       - { name: Continuity }
//! ```

mod command;
mod results;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use simsweep_core::{MetricCategory, Parameter};

pub use command::{CommandEngine, env_key};
pub use results::{RunResults, SeriesRecord, SeriesTable};

/// Solver phases that can be bound to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Mesh,
    Reset,
    Initialize,
    Solve,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Mesh => "mesh",
            Phase::Reset => "reset",
            Phase::Initialize => "initialize",
            Phase::Solve => "solve",
        }
    }
}

/// Shell command per phase. A missing entry makes the phase a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseCommands {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solve: Option<String>,
}

impl PhaseCommands {
    pub fn get(&self, phase: Phase) -> Option<&str> {
        match phase {
            Phase::Prepare => self.prepare.as_deref(),
            Phase::Mesh => self.mesh.as_deref(),
            Phase::Reset => self.reset.as_deref(),
            Phase::Initialize => self.initialize.as_deref(),
            Phase::Solve => self.solve.as_deref(),
        }
    }
}

fn default_monitor_unit() -> String {
    "-".to_string()
}

/// A metric series the engine promises to report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub name: String,
    #[serde(default = "default_monitor_unit")]
    pub unit: String,
}

/// Declared series per category, in header order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Monitors {
    #[serde(default)]
    pub coefficients: Vec<MonitorConfig>,
    #[serde(default)]
    pub reports: Vec<MonitorConfig>,
    #[serde(default)]
    pub residuals: Vec<MonitorConfig>,
}

impl Monitors {
    pub fn get(&self, category: MetricCategory) -> &[MonitorConfig] {
        match category {
            MetricCategory::Coefficients => &self.coefficients,
            MetricCategory::Reports => &self.reports,
            MetricCategory::Residuals => &self.residuals,
        }
    }
}

fn default_results_file() -> PathBuf {
    PathBuf::from("results.yaml")
}

/// Engine section of the harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory commands run in; defaults to the config file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub commands: PhaseCommands,
    /// Written by the solve command, relative to `working_dir`
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
    /// Parameters the engine exposes, with their initial values
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub monitors: Monitors,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            commands: PhaseCommands::default(),
            results_file: default_results_file(),
            parameters: Vec::new(),
            monitors: Monitors::default(),
        }
    }
}
