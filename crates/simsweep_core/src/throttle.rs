//! Cooperative countdown between runs.
//!
//! The pause gives an operator a window to stop a sweep before the next run
//! starts. It blocks the controller and wakes immediately when the
//! [`CancelToken`] fires.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Shared cancellation flag that can wake a sleeping pause.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `timeout` or until cancelled. Returns whether cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut cancelled = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
        *cancelled
    }
}

/// Sink for human-readable status lines.
pub trait Announcer {
    fn announce(&mut self, message: &str);
}

/// Emits announcements as `tracing` info events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnnouncer;

impl Announcer for TracingAnnouncer {
    fn announce(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Messages keyed by the time remaining when they are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchedule {
    entries: Vec<(Duration, String)>,
    closing: String,
}

impl MessageSchedule {
    pub fn new(closing: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            closing: closing.into(),
        }
    }

    pub fn at(mut self, remaining: Duration, message: impl Into<String>) -> Self {
        self.entries.push((remaining, message.into()));
        self.entries.sort_by(|a, b| b.0.cmp(&a.0));
        self
    }

    /// `Next run will start in N seconds...`, then a per-second countdown
    /// over the last five seconds.
    pub fn countdown(total: Duration) -> Self {
        let mut schedule = Self::new("Starting next run...").at(
            total,
            format!("Next run will start in {} seconds...", total.as_secs()),
        );
        for secs in 1..=5u64 {
            let remaining = Duration::from_secs(secs);
            if remaining >= total {
                continue;
            }
            let message = if secs == 5 {
                "Next run will start in 5...".to_string()
            } else {
                format!("{secs}...")
            };
            schedule = schedule.at(remaining, message);
        }
        schedule
    }
}

/// Result of a pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Completed,
    Interrupted,
}

/// Blocking, cancellable delay with scheduled messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    total: Duration,
    schedule: MessageSchedule,
}

impl Throttle {
    pub fn new(total: Duration, schedule: MessageSchedule) -> Self {
        Self { total, schedule }
    }

    /// Countdown of `seconds` with the standard messages
    pub fn countdown(seconds: u64) -> Self {
        let total = Duration::from_secs(seconds);
        Self::new(total, MessageSchedule::countdown(total))
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Wait out the pause. An interrupted pause announces nothing further.
    pub fn pause(&self, announcer: &mut dyn Announcer, cancel: &CancelToken) -> PauseOutcome {
        if cancel.is_cancelled() {
            return PauseOutcome::Interrupted;
        }

        let mut elapsed = Duration::ZERO;
        for (remaining, message) in &self.schedule.entries {
            let Some(due) = self.total.checked_sub(*remaining) else {
                continue;
            };
            if due > elapsed {
                if cancel.wait_timeout(due - elapsed) {
                    return PauseOutcome::Interrupted;
                }
                elapsed = due;
            }
            announcer.announce(message);
        }

        if self.total > elapsed && cancel.wait_timeout(self.total - elapsed) {
            return PauseOutcome::Interrupted;
        }
        announcer.announce(&self.schedule.closing);
        PauseOutcome::Completed
    }
}
