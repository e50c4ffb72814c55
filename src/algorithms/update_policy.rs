//! Update-worthiness policy for outgoing location fixes
//!
//! A candidate fix is sent when it is the first of a session, when it has moved
//! far enough from the last successfully sent fix, or when enough time has passed
//! since that fix. Either threshold alone is sufficient: the distance threshold
//! trips first while moving, the interval acts as a heartbeat while stationary.

use crate::core::{LocationFix, DEFAULT_MIN_DISTANCE_M, DEFAULT_MIN_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Thresholds for the update policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePolicyConfig {
    /// Movement that warrants a send (meters)
    pub min_distance_m: f64,
    /// Time since last send that warrants a send (milliseconds)
    pub min_interval_ms: u64,
}

impl Default for UpdatePolicyConfig {
    fn default() -> Self {
        Self {
            min_distance_m: DEFAULT_MIN_DISTANCE_M,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

/// Outcome of evaluating a candidate fix, with the measurement that decided it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateDecision {
    /// Nothing has been sent this session
    FirstFix,
    /// Moved at least the distance threshold
    Moved { distance_m: f64 },
    /// Heartbeat interval elapsed
    IntervalElapsed { elapsed_ms: u64 },
    /// Neither threshold reached
    Suppressed { distance_m: f64, elapsed_ms: u64 },
}

impl UpdateDecision {
    pub fn should_send(&self) -> bool {
        !matches!(self, UpdateDecision::Suppressed { .. })
    }
}

/// Pure decision function over a candidate and the last sent fix
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateDecisionPolicy {
    config: UpdatePolicyConfig,
}

impl UpdateDecisionPolicy {
    pub fn new(config: UpdatePolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UpdatePolicyConfig {
        &self.config
    }

    /// Whether `candidate` should be transmitted given the last successfully sent fix
    pub fn should_send(&self, candidate: &LocationFix, last_sent: Option<&LocationFix>) -> bool {
        self.evaluate(candidate, last_sent).should_send()
    }

    /// Evaluate a candidate and report which rule decided the outcome
    pub fn evaluate(&self, candidate: &LocationFix, last_sent: Option<&LocationFix>) -> UpdateDecision {
        let last = match last_sent {
            Some(last) => last,
            None => return UpdateDecision::FirstFix,
        };

        let distance_m = last.distance_to(candidate);
        if distance_m >= self.config.min_distance_m {
            return UpdateDecision::Moved { distance_m };
        }

        let elapsed_ms = candidate.elapsed_since(last);
        if elapsed_ms >= self.config.min_interval_ms {
            return UpdateDecision::IntervalElapsed { elapsed_ms };
        }

        trace!(distance_m, elapsed_ms, "fix below both thresholds");
        UpdateDecision::Suppressed { distance_m, elapsed_ms }
    }
}
