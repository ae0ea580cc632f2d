//! Harness configuration file
//!
//! A single YAML document describing where results go, how the engine is
//! driven and what to sweep:
//!
//! ```yaml
//! output: results/tunnel.csv
//! pause_seconds: 10
//! engine:
//!   commands:
//!     solve: ./solve.sh
//!   parameters:
//!     - { name: Back Offset, value: 9.0, unit: m }
//! sweep:
//!   max_steps: 1000
//!   comment: tunnel length study
//!   axes:
//!     - name: length
//!       start: 0.0
//!       step: 2.0
//!       max: 8.0
//!       bindings:
//!         - { parameter: Back Offset, transform: { type: offset, base: 9.0 } }
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simsweep_core::SweepSpec;

use crate::engine::EngineConfig;

/// Errors loading a harness configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

fn default_output() -> PathBuf {
    PathBuf::from("sweep_results.csv")
}

fn default_pause_seconds() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Results log path
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Countdown between runs; 0 disables it
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: u64,
    #[serde(default)]
    pub engine: EngineConfig,
    pub sweep: SweepSpec,
}

impl HarnessConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Load from `path` and resolve relative paths against its directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        tracing::debug!(path = %path.display(), "Loaded harness config");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        self.engine.working_dir = Some(match self.engine.working_dir.take() {
            Some(dir) if dir.is_relative() => base.join(dir),
            Some(dir) => dir,
            None => base.to_path_buf(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simsweep_core::sweep::BindingTransform;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
output: results/tunnel.csv
engine:
  working_dir: case
  commands:
    solve: ./solve.sh
  parameters:
    - name: Back Offset
      value: 9.0
      unit: m
    - name: Side Offset
      value: 2.0
  monitors:
    coefficients:
      - name: Drag Coefficient Monitor
        unit: none
    residuals:
      - name: Continuity
sweep:
  max_steps: 1000
  axes:
    - name: length
      start: 0.0
      step: 2.0
      max: 8.0
      bindings:
        - parameter: Back Offset
          transform:
            type: offset
            base: 9.0
    - name: frontal
      start: 1.0
      step: 1.5
      max: 3.0
      snap_first: true
      bindings:
        - parameter: Side Offset
          transform:
            type: scale
            base: 2.0
"#;

    #[test]
    fn test_parse_sample() {
        let config = HarnessConfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.pause_seconds, 10);
        assert_eq!(config.sweep.max_steps, Some(1000));
        assert_eq!(config.sweep.comment, "N/A");
        assert_eq!(config.sweep.axes.len(), 2);
        assert_eq!(
            config.sweep.axes[0].bindings[0].transform,
            BindingTransform::Offset { base: 9.0 }
        );
        assert!(config.sweep.axes[1].snap_first);
        assert_eq!(config.engine.parameters[1].unit, None);
        assert_eq!(config.engine.monitors.residuals[0].unit, "-");
        assert_eq!(config.engine.results_file, PathBuf::from("results.yaml"));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.yaml");
        fs::write(&path, SAMPLE).unwrap();

        let config = HarnessConfig::load(&path).unwrap();

        assert_eq!(config.output, dir.path().join("results/tunnel.csv"));
        assert_eq!(config.engine.working_dir, Some(dir.path().join("case")));
    }

    #[test]
    fn test_working_dir_defaults_to_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.yaml");
        fs::write(&path, "sweep: {}\n").unwrap();

        let config = HarnessConfig::load(&path).unwrap();

        assert_eq!(config.engine.working_dir, Some(dir.path().to_path_buf()));
        assert_eq!(config.output, dir.path().join("sweep_results.csv"));
        assert!(config.sweep.axes.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = HarnessConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "sweep: [unclosed\n").unwrap();

        let err = HarnessConfig::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }
}
