//! Circuit breaker (gate) for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: a single trial call is probing recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: reset_timeout elapsed; the caller that flips the state gets the trial
//! Half-Open → Closed: trial succeeds (failure counter reset)
//! Half-Open → Open: trial fails (reset window restarts)
//! ```
//!
//! # Design Decisions
//! - One gate per protected downstream, shared via `Arc` for the process lifetime
//! - A single mutex is held across every check-and-transition, so admission and
//!   recording are linearizable; there is no unlock/relock window in which two
//!   callers can both win the trial
//! - Every other caller is denied until the trial's outcome is recorded
//! - `try_acquire` hands out a [`GatePermit`]; dropping it without an outcome
//!   records a failure, so a cancelled or timed-out caller cannot strand a trial
//! - Outcomes from permits admitted while Closed do not settle a Half-Open trial
//! - The gate never errors; callers map a denial to their own "unavailable" error

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::GateSettings;
use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};

/// Gate state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

/// Immutable gate tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Consecutive failures that open the gate.
    pub failure_threshold: u32,
    /// How long the gate stays open before admitting a trial.
    pub reset_timeout: Duration,
}

impl GateConfig {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(10))
    }
}

impl From<&GateSettings> for GateConfig {
    fn from(settings: &GateSettings) -> Self {
        Self::new(
            settings.failure_threshold,
            Duration::from_secs(settings.reset_timeout_secs),
        )
    }
}

/// Point-in-time view of a gate, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct GateSnapshot {
    pub resource: String,
    pub state: GateState,
    pub consecutive_failures: u32,
}

/// Who reports an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reporter {
    /// Bare `record_*` call; trusted to belong to the current trial.
    Unattributed,
    /// Permit admitted while Closed.
    Admitted,
    /// Permit holding the Half-Open trial.
    Trial,
}

#[derive(Debug)]
struct GateInner {
    state: GateState,
    consecutive_failures: u32,
    /// Set when the gate opens, cleared when it closes.
    opened_at: Option<Instant>,
}

/// Tri-state admission controller for one downstream dependency.
#[derive(Debug)]
pub struct Gate {
    resource: String,
    config: GateConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<GateInner>,
}

/// One admitted call, obtained from [`Gate::try_acquire`].
///
/// Report the outcome with [`succeed`](Self::succeed) or [`fail`](Self::fail).
/// Dropping the permit unreported counts as a failure.
#[derive(Debug)]
#[must_use = "dropping a permit records a failure"]
pub struct GatePermit<'a> {
    gate: &'a Gate,
    trial: bool,
    settled: bool,
}

impl GatePermit<'_> {
    /// Whether this permit carries the Half-Open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.gate.settle(true, self.reporter());
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.gate.settle(false, self.reporter());
    }

    fn reporter(&self) -> Reporter {
        if self.trial {
            Reporter::Trial
        } else {
            Reporter::Admitted
        }
    }
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                resource = %self.gate.resource,
                trial = self.trial,
                "Gate permit dropped without an outcome, recording failure"
            );
            self.gate.settle(false, self.reporter());
        }
    }
}

impl Gate {
    /// Create a closed gate driven by the system clock.
    pub fn new(resource: impl Into<String>, config: GateConfig) -> Self {
        Self::with_clock(resource, config, Arc::new(SystemClock))
    }

    /// Create a closed gate driven by the given clock.
    pub fn with_clock(
        resource: impl Into<String>,
        config: GateConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = GateConfig {
            failure_threshold: config.failure_threshold.max(1),
            ..config
        };
        let gate = Self {
            resource: resource.into(),
            config,
            clock,
            inner: Mutex::new(GateInner {
                state: GateState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        };
        metrics::record_gate_state(&gate.resource, GateState::Closed);
        gate
    }

    /// Name of the protected resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn config(&self) -> GateConfig {
        self.config
    }

    /// Decide whether a call may be attempted now.
    ///
    /// Only side effect: flipping Open to Half-Open when the reset timeout has
    /// elapsed, in which case this caller receives the single trial. The caller
    /// must then record an outcome; until it does, every other caller is denied.
    pub fn allow_request(&self) -> bool {
        self.admit().is_some()
    }

    /// Admit a call and tie its outcome to the returned permit.
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        self.admit().map(|trial| GatePermit {
            gate: self,
            trial,
            settled: false,
        })
    }

    /// Record a successful downstream call.
    ///
    /// While Half-Open this closes the gate, so it must come from the trial
    /// holder. Calls admitted through [`try_acquire`](Self::try_acquire) report
    /// via their permit, which drops stale outcomes instead.
    pub fn record_success(&self) {
        self.settle(true, Reporter::Unattributed);
    }

    /// Record a failed downstream call (including timeouts).
    pub fn record_failure(&self) {
        self.settle(false, Reporter::Unattributed);
    }

    /// Current state. May be stale by the time the caller acts on it.
    pub fn current_state(&self) -> GateState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> GateSnapshot {
        let inner = self.inner.lock();
        GateSnapshot {
            resource: self.resource.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }

    /// `Some(is_trial)` when admitted.
    fn admit(&self) -> Option<bool> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();

        let (admitted, transition) = match inner.state {
            GateState::Closed => (Some(false), None),
            GateState::Open => {
                if self.reset_elapsed(inner.opened_at, now) {
                    inner.state = GateState::HalfOpen;
                    (Some(true), Some((GateState::Open, GateState::HalfOpen)))
                } else {
                    (None, None)
                }
            }
            GateState::HalfOpen => (None, None),
        };
        drop(inner);

        if let Some((from, to)) = transition {
            self.on_transition(from, to);
        }
        if admitted.is_none() {
            metrics::record_gate_rejection(&self.resource);
        }
        admitted
    }

    fn settle(&self, success: bool, reporter: Reporter) {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        let transition = match (inner.state, success) {
            (GateState::Closed, true) => {
                inner.consecutive_failures = 0;
                None
            }
            (GateState::Closed, false) => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = GateState::Open;
                    inner.opened_at = Some(now);
                    Some((GateState::Closed, GateState::Open))
                } else {
                    None
                }
            }
            (GateState::HalfOpen, _) if reporter == Reporter::Admitted => {
                tracing::debug!(resource = %self.resource, success, "Straggler outcome ignored during trial");
                return;
            }
            (GateState::HalfOpen, true) => {
                inner.state = GateState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                Some((GateState::HalfOpen, GateState::Closed))
            }
            (GateState::HalfOpen, false) => {
                inner.state = GateState::Open;
                inner.opened_at = Some(now);
                Some((GateState::HalfOpen, GateState::Open))
            }
            (GateState::Open, _) => None,
        };
        let failures = inner.consecutive_failures;
        drop(inner);

        if let Some((from, to)) = transition {
            self.on_transition(from, to);
        } else if !success {
            tracing::debug!(resource = %self.resource, consecutive_failures = failures, "Downstream failure recorded");
        }
    }

    fn reset_elapsed(&self, since: Option<Instant>, now: Instant) -> bool {
        since.map_or(true, |at| {
            now.saturating_duration_since(at) >= self.config.reset_timeout
        })
    }

    fn on_transition(&self, from: GateState, to: GateState) {
        match to {
            GateState::Open => tracing::warn!(
                resource = %self.resource,
                from = ?from,
                reset_timeout = ?self.config.reset_timeout,
                "Gate opened"
            ),
            _ => tracing::info!(resource = %self.resource, from = ?from, to = ?to, "Gate state changed"),
        }
        metrics::record_gate_state(&self.resource, to);
    }
}
