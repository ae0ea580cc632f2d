use serde::{Deserialize, Serialize};

use super::{Parameter, format_value};

/// Groups of metric series an engine exposes, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Coefficients,
    Reports,
    Residuals,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] = [
        MetricCategory::Coefficients,
        MetricCategory::Reports,
        MetricCategory::Residuals,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricCategory::Coefficients => "coefficients",
            MetricCategory::Reports => "reports",
            MetricCategory::Residuals => "residuals",
        }
    }
}

/// A named, unit-tagged sequence of values indexed by completed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    /// Value recorded after iteration `index` (zero-based).
    pub fn value_at_iteration(&self, index: u64) -> Option<f64> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Size of the generated volume mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshStats {
    pub cells: u64,
    pub faces: u64,
    pub vertices: u64,
}

/// Everything a completed run produced, in results-log column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    /// Every parameter the engine exposes, as applied for this run
    pub parameters: Vec<Parameter>,
    pub coefficients: Vec<f64>,
    pub reports: Vec<f64>,
    /// Wall time of geometry preparation plus meshing, in minutes
    pub mesh_minutes: f64,
    pub mesh: MeshStats,
    /// Number of completed solver iterations
    pub iterations: u64,
    pub residuals: Vec<f64>,
}

impl RunMetrics {
    /// Flatten into data cells: parameters, coefficients, reports, derived
    /// columns, residuals.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(
            self.parameters.len()
                + self.coefficients.len()
                + self.reports.len()
                + self.residuals.len()
                + 5,
        );
        cells.extend(self.parameters.iter().map(|p| format_value(p.value)));
        cells.extend(self.coefficients.iter().copied().map(format_value));
        cells.extend(self.reports.iter().copied().map(format_value));
        cells.push(format_value(self.mesh_minutes));
        cells.push(self.mesh.cells.to_string());
        cells.push(self.mesh.faces.to_string());
        cells.push(self.mesh.vertices.to_string());
        cells.push(self.iterations.to_string());
        cells.extend(self.residuals.iter().copied().map(format_value));
        cells
    }
}
