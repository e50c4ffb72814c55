//! Sharing session state machine
//!
//! Pure bookkeeping for one sharing session: which fix was last accepted by the
//! backend, which one is in flight and which one is waiting behind it. The
//! controller actor owns exactly one of these and is the only code that mutates
//! it; it performs the I/O the returned actions ask for.

use crate::algorithms::{UpdateDecision, UpdateDecisionPolicy};
use crate::api::types::SharingState;
use crate::core::LocationFix;
use crate::transport::SubmissionResult;

/// What the controller should do with an incoming fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixAction {
    /// Sharing is off
    Ignored,
    /// Below both thresholds
    Suppressed(UpdateDecision),
    /// Channel free; submit this fix now
    Submit { fix: LocationFix, decision: UpdateDecision },
    /// A submission is in flight; the fix waits (replacing any older waiter)
    Coalesced { decision: UpdateDecision, replaced: bool },
}

/// Result of folding a submission outcome into the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionAction {
    /// Outcome belongs to a stopped or restarted session
    Stale,
    /// Outcome applied; submit `next` if present
    Applied { next: Option<LocationFix> },
}

/// State of one sharing session.
///
/// Invariant: when `active` is false every other field is cleared, so nothing
/// is in flight and nothing is waiting.
#[derive(Debug, Clone, Default)]
pub struct SharingSession {
    active: bool,
    last_sent_fix: Option<LocationFix>,
    last_sent_at_ms: Option<u64>,
    in_flight: Option<LocationFix>,
    coalesced: Option<LocationFix>,
    /// Bumped on every activation and deactivation so late outcomes can be recognised
    epoch: u64,
    sent_count: u64,
    failed_count: u64,
}

impl SharingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SharingState {
        if !self.active {
            SharingState::Inactive
        } else if self.in_flight.is_some() {
            SharingState::Submitting
        } else {
            SharingState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn last_sent_fix(&self) -> Option<&LocationFix> {
        self.last_sent_fix.as_ref()
    }

    pub fn last_sent_at_ms(&self) -> Option<u64> {
        self.last_sent_at_ms
    }

    pub fn in_flight(&self) -> Option<&LocationFix> {
        self.in_flight.as_ref()
    }

    pub fn coalesced(&self) -> Option<&LocationFix> {
        self.coalesced.as_ref()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count
    }

    /// Begin a fresh session. Returns false if already active.
    pub fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.clear();
        self.active = true;
        self.epoch += 1;
        true
    }

    /// End the session and clear its fields. Returns false if already inactive.
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.clear();
        self.epoch += 1;
        true
    }

    fn clear(&mut self) {
        self.active = false;
        self.last_sent_fix = None;
        self.last_sent_at_ms = None;
        self.in_flight = None;
        self.coalesced = None;
        self.sent_count = 0;
        self.failed_count = 0;
    }

    /// Evaluate a fix against the last successfully sent one
    pub fn on_fix(&mut self, fix: LocationFix, policy: &UpdateDecisionPolicy) -> FixAction {
        if !self.active {
            return FixAction::Ignored;
        }

        let decision = policy.evaluate(&fix, self.last_sent_fix.as_ref());
        if !decision.should_send() {
            return FixAction::Suppressed(decision);
        }

        if self.in_flight.is_some() {
            let replaced = self.coalesced.replace(fix).is_some();
            return FixAction::Coalesced { decision, replaced };
        }

        self.in_flight = Some(fix);
        FixAction::Submit { fix, decision }
    }

    /// Fold the outcome of the in-flight submission into the session.
    ///
    /// Success advances the last sent fix; failure leaves it untouched so the
    /// next candidate is still compared against what the backend actually has.
    /// A waiting fix is re-evaluated against the updated state and, if it still
    /// qualifies, becomes the new in-flight submission.
    pub fn complete(
        &mut self,
        epoch: u64,
        result: &SubmissionResult<()>,
        now_ms: u64,
        policy: &UpdateDecisionPolicy,
    ) -> CompletionAction {
        if epoch != self.epoch || !self.active {
            return CompletionAction::Stale;
        }
        let sent = match self.in_flight.take() {
            Some(fix) => fix,
            None => return CompletionAction::Stale,
        };

        match result {
            Ok(()) => {
                self.last_sent_fix = Some(sent);
                self.last_sent_at_ms = Some(now_ms);
                self.sent_count += 1;
            }
            Err(_) => self.failed_count += 1,
        }

        let last_sent = self.last_sent_fix;
        let next = self
            .coalesced
            .take()
            .filter(|candidate| policy.should_send(candidate, last_sent.as_ref()));
        self.in_flight = next;

        CompletionAction::Applied { next }
    }
}
