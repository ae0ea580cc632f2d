use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use simsweep_core::{EngineError, MeshStats, MetricCategory};

/// One series as written by the solve command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTable {
    #[serde(default)]
    pub coefficients: Vec<SeriesRecord>,
    #[serde(default)]
    pub reports: Vec<SeriesRecord>,
    #[serde(default)]
    pub residuals: Vec<SeriesRecord>,
}

/// Contents of the results file left behind by a solve.
///
/// ```yaml
/// iterations: 1000
/// mesh: { cells: 48211, faces: 130502, vertices: 52044 }
/// series:
///   coefficients:
///     - name: Drag Coefficient Monitor
///       values: [0.41, 0.36, 0.33]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub iterations: u64,
    #[serde(default)]
    pub mesh: MeshStats,
    #[serde(default)]
    pub series: SeriesTable,
}

impl RunResults {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::new(format!(
                "failed to read results file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content).map_err(|e| {
            EngineError::new(format!(
                "failed to parse results file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn series(&self, category: MetricCategory) -> &[SeriesRecord] {
        match category {
            MetricCategory::Coefficients => &self.series.coefficients,
            MetricCategory::Reports => &self.series.reports,
            MetricCategory::Residuals => &self.series.residuals,
        }
    }

    pub fn find(&self, category: MetricCategory, name: &str) -> Option<&SeriesRecord> {
        self.series(category).iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results_file() {
        let yaml = r#"
iterations: 3
mesh:
  cells: 48211
  faces: 130502
  vertices: 52044
series:
  coefficients:
    - name: Drag Coefficient Monitor
      unit: none
      values: [0.41, 0.36, 0.33]
  residuals:
    - name: Continuity
      values: [1.0, 0.1, 0.01]
"#;
        let results = RunResults::from_yaml(yaml).unwrap();

        assert_eq!(results.iterations, 3);
        assert_eq!(results.mesh.faces, 130_502);
        assert!(results.series(MetricCategory::Reports).is_empty());
        let drag = results
            .find(MetricCategory::Coefficients, "Drag Coefficient Monitor")
            .unwrap();
        assert_eq!(drag.values, vec![0.41, 0.36, 0.33]);
        assert_eq!(drag.unit.as_deref(), Some("none"));
    }

    #[test]
    fn test_missing_file_is_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunResults::load(&dir.path().join("results.yaml")).unwrap_err();
        assert!(err.message().starts_with("failed to read results file"));
    }

    #[test]
    fn test_mesh_defaults_to_zero() {
        let results = RunResults::from_yaml("iterations: 10\n").unwrap();
        assert_eq!(results.mesh, MeshStats::default());
    }
}
