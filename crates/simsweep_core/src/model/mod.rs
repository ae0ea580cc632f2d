//! Data types shared by the executor, the results log and the sweep controller.

mod metrics;
mod outcome;
mod params;

pub use metrics::{MeshStats, MetricCategory, MetricSeries, RunMetrics};
pub use outcome::{NO_ERROR, RunOutcome};
pub use params::{Parameter, ParameterSet, format_value};
