//! Sequential sweep execution with one log row per run.

use crate::error::ConfigurationError;
use crate::log::{ResultLog, ResultRow};
use crate::model::{ParameterSet, RunOutcome};
use crate::throttle::{Announcer, CancelToken, PauseOutcome, Throttle, TracingAnnouncer};

use super::SweepSpec;

/// Controller lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SweepState {
    #[default]
    Idle,
    /// Executing the point at these axis indices
    Running { indices: Vec<usize> },
    /// The last sweep was refused before any run
    Aborted,
}

/// What a finished (or cancelled) sweep did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    /// Runs attempted; each produced one log row
    pub runs: usize,
    pub failures: usize,
    /// Stopped early by the cancel token
    pub cancelled: bool,
}

/// Expands a [`SweepSpec`] and drives one run per point, strictly in order.
pub struct SweepController {
    state: SweepState,
    throttle: Option<Throttle>,
    announcer: Box<dyn Announcer>,
    cancel: CancelToken,
}

impl Default for SweepController {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepController {
    pub fn new() -> Self {
        Self {
            state: SweepState::Idle,
            throttle: None,
            announcer: Box::new(TracingAnnouncer),
            cancel: CancelToken::new(),
        }
    }

    /// Pause between consecutive runs
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub fn with_announcer(mut self, announcer: impl Announcer + 'static) -> Self {
        self.announcer = Box::new(announcer);
        self
    }

    /// Token checked before each run and used to interrupt pauses
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> &SweepState {
        &self.state
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Refuse the sweep before any run
    pub fn abort(&mut self, reason: &ConfigurationError) {
        tracing::error!("Sweep refused: {reason}");
        self.state = SweepState::Aborted;
    }

    /// Run every point of `spec` through `on_each`, appending one row per run.
    ///
    /// Only an invalid spec is an error; it is reported before anything runs.
    /// Failed runs are logged with their error text and the sweep moves on.
    pub fn run<F>(
        &mut self,
        spec: &SweepSpec,
        mut on_each: F,
        log: &ResultLog,
    ) -> Result<SweepSummary, ConfigurationError>
    where
        F: FnMut(&ParameterSet) -> RunOutcome,
    {
        let plan = match spec.plan() {
            Ok(plan) => plan,
            Err(e) => {
                self.abort(&e);
                return Err(e);
            }
        };

        let total = plan.total_points();
        tracing::info!(total, shape = ?plan.shape(), "Starting sweep");

        let mut summary = SweepSummary::default();
        for point in plan.points() {
            if summary.runs > 0 {
                if let Some(throttle) = &self.throttle {
                    if throttle.pause(self.announcer.as_mut(), &self.cancel)
                        == PauseOutcome::Interrupted
                    {
                        tracing::debug!("Pause interrupted");
                    }
                }
            }
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    completed = summary.runs,
                    total,
                    "Sweep cancelled before the next run"
                );
                summary.cancelled = true;
                break;
            }

            self.state = SweepState::Running {
                indices: point.indices.clone(),
            };
            tracing::info!("Run {}/{}", summary.runs + 1, total);

            let outcome = on_each(&point.params);
            if !outcome.is_success() {
                summary.failures += 1;
            }

            let row = ResultRow::from_outcome(log.schema(), &point.params, &outcome, &spec.comment);
            log.append_row(&row);
            summary.runs += 1;
        }

        self.state = SweepState::Idle;
        tracing::info!(
            runs = summary.runs,
            failures = summary.failures,
            cancelled = summary.cancelled,
            "Sweep finished"
        );
        Ok(summary)
    }
}
