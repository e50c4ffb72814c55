//! Mock submitter implementation for testing and dry runs

use crate::core::LocationFix;
use crate::transport::error::{SubmissionError, SubmissionResult};
use crate::transport::submitter::LocationSubmitter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{oneshot, watch};

/// How the mock resolves submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Resolve immediately, consuming scripted failures first
    Immediate,
    /// Hold every call until the test releases it
    Manual,
}

/// A submission observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedFix {
    pub fix: LocationFix,
    pub token: String,
}

struct MockState {
    mode: SubmitMode,
    submitted: Vec<SubmittedFix>,
    scripted: VecDeque<SubmissionResult<()>>,
    held: VecDeque<oneshot::Sender<SubmissionResult<()>>>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Mock submitter for testing and development
#[derive(Clone)]
pub struct MockSubmitter {
    state: Arc<Mutex<MockState>>,
    calls: Arc<watch::Sender<usize>>,
}

impl MockSubmitter {
    pub fn new(mode: SubmitMode) -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(MockState {
                mode,
                submitted: Vec::new(),
                scripted: VecDeque::new(),
                held: VecDeque::new(),
                in_flight: 0,
                max_in_flight: 0,
            })),
            calls: Arc::new(calls),
        }
    }

    /// Succeeds every call unless a failure is scripted
    pub fn immediate() -> Self {
        Self::new(SubmitMode::Immediate)
    }

    /// Holds every call until [`MockSubmitter::release_next`]
    pub fn manual() -> Self {
        Self::new(SubmitMode::Manual)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded calls from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue an outcome for the next immediate-mode call
    pub fn script(&self, result: SubmissionResult<()>) {
        self.lock().scripted.push_back(result);
    }

    /// Resolve the oldest held call. Returns false if none is waiting.
    pub fn release_next(&self, result: SubmissionResult<()>) -> bool {
        let sender = self.lock().held.pop_front();
        match sender {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }

    /// Every submission seen so far, in call order
    pub fn submitted(&self) -> Vec<SubmittedFix> {
        self.lock().submitted.clone()
    }

    pub fn submitted_fixes(&self) -> Vec<LocationFix> {
        self.lock().submitted.iter().map(|s| s.fix).collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().submitted.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Highest number of simultaneously outstanding calls observed
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    /// Wait until at least `count` calls have been made
    pub async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.calls.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|calls| *calls >= count).await;
    }
}

/// Decrements the in-flight counter even if the calling task is aborted
struct InFlightGuard {
    state: Arc<Mutex<MockState>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

#[async_trait]
impl LocationSubmitter for MockSubmitter {
    async fn submit(&self, fix: &LocationFix, token: &str) -> SubmissionResult<()> {
        let (waiter, scripted, calls) = {
            let mut state = self.lock();
            state.submitted.push(SubmittedFix {
                fix: *fix,
                token: token.to_string(),
            });
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);

            match state.mode {
                SubmitMode::Manual => {
                    let (tx, rx) = oneshot::channel();
                    state.held.push_back(tx);
                    (Some(rx), None, state.submitted.len())
                }
                SubmitMode::Immediate => (None, state.scripted.pop_front(), state.submitted.len()),
            }
        };
        let _guard = InFlightGuard {
            state: Arc::clone(&self.state),
        };
        self.calls.send_replace(calls);

        match waiter {
            Some(rx) => rx.await.unwrap_or(Err(SubmissionError::Cancelled)),
            None => scripted.unwrap_or(Ok(())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_immediate_mode_uses_script_then_succeeds() {
        let mock = MockSubmitter::immediate();
        mock.script(Err(SubmissionError::Transport("offline".to_string())));
        let fix = LocationFix::new(1.0, 2.0, 0);

        assert!(mock.submit(&fix, "t").await.is_err());
        assert!(mock.submit(&fix, "t").await.is_ok());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.in_flight(), 0);
        assert_eq!(mock.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_manual_mode_holds_until_released() {
        let mock = MockSubmitter::manual();
        let fix = LocationFix::new(1.0, 2.0, 0);

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.submit(&fix, "token-1").await })
        };
        mock.wait_for_calls(1).await;
        assert_eq!(mock.in_flight(), 1);

        assert!(mock.release_next(Ok(())));
        assert_eq!(task.await.unwrap(), Ok(()));
        assert_eq!(mock.in_flight(), 0);
        assert_eq!(mock.submitted()[0].token, "token-1");
        assert!(!mock.release_next(Ok(())));
    }

    #[tokio::test]
    async fn test_aborted_call_releases_in_flight_slot() {
        let mock = MockSubmitter::manual();
        let fix = LocationFix::new(1.0, 2.0, 0);

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.submit(&fix, "t").await })
        };
        mock.wait_for_calls(1).await;
        task.abort();
        let _ = task.await;

        assert_eq!(mock.in_flight(), 0);
    }
}
