use super::{Parameter, RunMetrics};

/// Error column sentinel for runs that completed normally.
pub const NO_ERROR: &str = "N/A";

/// Result of a single run, consumed once when its log row is built.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success(RunMetrics),
    Failure {
        error: String,
        /// Engine parameter values at the time of failure; empty when unknown
        parameters: Vec<Parameter>,
    },
}

impl RunOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        RunOutcome::Failure {
            error: error.into(),
            parameters: Vec::new(),
        }
    }

    /// Attach the parameter snapshot written to a failed run's row.
    /// Successful outcomes are returned unchanged.
    pub fn with_parameters(self, snapshot: Vec<Parameter>) -> Self {
        match self {
            RunOutcome::Failure { error, .. } => RunOutcome::Failure {
                error,
                parameters: snapshot,
            },
            success => success,
        }
    }

    /// Parameter values recorded with the outcome
    pub fn parameters(&self) -> &[Parameter] {
        match self {
            RunOutcome::Success(metrics) => &metrics.parameters,
            RunOutcome::Failure { parameters, .. } => parameters,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }

    pub fn metrics(&self) -> Option<&RunMetrics> {
        match self {
            RunOutcome::Success(metrics) => Some(metrics),
            RunOutcome::Failure { .. } => None,
        }
    }

    /// Text for the error column: the failure message, or [`NO_ERROR`].
    pub fn error_text(&self) -> &str {
        match self {
            RunOutcome::Success(_) => NO_ERROR,
            RunOutcome::Failure { error, .. } => error,
        }
    }
}
