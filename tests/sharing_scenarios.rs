//! End-to-end scenarios for the sharing controller.
//!
//! These drive the public API the way the UI does:
//! - Threshold decisions over a short walk
//! - Failed submissions leaving the last accepted fix in place
//! - Logout racing an in-flight submission
//! - Logout and login landing before the controller reacts
//! - Coalescing while a submission is in flight
//! - Stop idempotence

use location_sharing::transport::{MockSubmitter, SubmissionError};
use location_sharing::{
    AuthGate, LocationFix, SessionAuthGate, SharingController, SharingError, SharingState,
    SharingStatus, UpdatePolicyConfig,
};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Test Helpers
// =============================================================================

fn signed_in() -> Arc<SessionAuthGate> {
    Arc::new(SessionAuthGate::authenticated("access-token"))
}

/// Controller with permission granted and sharing started
async fn sharing(gate: &Arc<SessionAuthGate>, mock: &MockSubmitter) -> SharingController {
    let auth: Arc<dyn AuthGate> = gate.clone();
    let controller = SharingController::new(UpdatePolicyConfig::default(), auth, Arc::new(mock.clone()));
    controller.set_location_permission(true);
    controller.start().expect("start should be accepted");
    controller.flush().await.expect("controller open");
    assert!(controller.is_active());
    controller
}

async fn wait_for<F>(controller: &SharingController, predicate: F) -> SharingStatus
where
    F: FnMut(&SharingStatus) -> bool,
{
    let mut rx = controller.subscribe();
    let status = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("status condition not reached")
        .expect("controller closed")
        .clone();
    status
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_short_walk_sends_only_significant_fixes() {
    let gate = signed_in();
    let mock = MockSubmitter::immediate();
    let controller = sharing(&gate, &mock).await;

    let first = LocationFix::new(3.4516, -76.5320, 0).with_accuracy(5.0);
    controller.on_fix(first);
    let status = wait_for(&controller, |s| s.sent_count == 1).await;
    assert_eq!(status.last_sent_fix, Some(first));
    assert!(status.last_sent_at_ms.is_some());

    // About 11 m north, two seconds later
    let second = LocationFix::new(3.4517, -76.5320, 2_000);
    controller.on_fix(second);
    let status = wait_for(&controller, |s| s.sent_count == 2).await;
    assert_eq!(status.last_sent_fix, Some(second));

    // About 1.5 m further, one second later
    let third = LocationFix::new(3.45171, -76.53201, 3_000);
    controller.on_fix(third);
    controller.flush().await.unwrap();

    let status = controller.status();
    assert_eq!(mock.call_count(), 2);
    assert_eq!(status.last_sent_fix, Some(second));
    assert_eq!(status.last_observed_fix, Some(third));
    assert_eq!(status.state, SharingState::Active);
}

#[tokio::test]
async fn test_failed_submission_keeps_last_sent_fix() {
    let gate = signed_in();
    let mock = MockSubmitter::immediate();
    mock.script(Ok(()));
    mock.script(Err(SubmissionError::Http {
        status: 503,
        message: "unavailable".to_string(),
    }));
    let controller = sharing(&gate, &mock).await;

    let first = LocationFix::new(3.4516, -76.5320, 0);
    controller.on_fix(first);
    wait_for(&controller, |s| s.sent_count == 1).await;

    controller.on_fix(LocationFix::new(3.4517, -76.5320, 2_000));
    let status = wait_for(&controller, |s| s.failed_count == 1).await;
    assert_eq!(status.last_sent_fix, Some(first));
    assert_eq!(status.state, SharingState::Active);
    assert!(matches!(status.last_error, Some(SharingError::Submission(_))));

    // Barely moved from the failed fix, but over 10 m from the accepted one
    let retry = LocationFix::new(3.45171, -76.5320, 3_000);
    controller.on_fix(retry);
    let status = wait_for(&controller, |s| s.sent_count == 2).await;
    assert_eq!(status.last_sent_fix, Some(retry));
    assert_eq!(status.last_error, None);
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_logout_while_submitting_discards_late_outcome() {
    let gate = signed_in();
    let mock = MockSubmitter::manual();
    let controller = sharing(&gate, &mock).await;

    controller.on_fix(LocationFix::new(3.4516, -76.5320, 0));
    mock.wait_for_calls(1).await;
    wait_for(&controller, |s| s.state == SharingState::Submitting).await;

    gate.sign_out();
    let status = wait_for(&controller, |s| s.state == SharingState::Inactive).await;
    assert_eq!(status.last_error, Some(SharingError::SessionLost));

    // The call may already be gone; either way nothing may change
    let _ = mock.release_next(Ok(()));
    controller.flush().await.unwrap();

    let status = controller.status();
    assert_eq!(status.state, SharingState::Inactive);
    assert!(status.last_sent_fix.is_none());
    assert_eq!(status.sent_count, 0);

    // New fixes stay local until the user starts again
    controller.on_fix(LocationFix::new(3.4600, -76.5320, 5_000));
    controller.flush().await.unwrap();
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_sharing_resumes_after_signing_back_in() {
    let gate = signed_in();
    let mock = MockSubmitter::immediate();
    let controller = sharing(&gate, &mock).await;

    gate.sign_out();
    wait_for(&controller, |s| s.state == SharingState::Inactive).await;
    assert!(controller.start().is_err());

    gate.sign_in("fresh-token");
    controller.start().unwrap();
    controller.on_fix(LocationFix::new(1.0, 1.0, 0));
    wait_for(&controller, |s| s.sent_count == 1).await;
    assert_eq!(mock.submitted()[0].token, "fresh-token");
}

#[tokio::test]
async fn test_logout_and_login_before_actor_runs_still_ends_session() {
    let gate = signed_in();
    let mock = MockSubmitter::immediate();
    let controller = sharing(&gate, &mock).await;

    controller.on_fix(LocationFix::new(1.0, 1.0, 0));
    wait_for(&controller, |s| s.sent_count == 1).await;

    // No await in between: the actor only ever sees the final Authenticated value
    gate.sign_out();
    gate.sign_in("other-user");
    controller.flush().await.unwrap();

    let status = controller.status();
    assert_eq!(status.state, SharingState::Inactive);
    assert_eq!(status.last_error, Some(SharingError::SessionLost));
    assert!(status.last_sent_fix.is_none());
    assert_eq!(status.sent_count, 0);

    controller.on_fix(LocationFix::new(2.0, 2.0, 60_000));
    controller.flush().await.unwrap();
    let tokens: Vec<String> = mock.submitted().into_iter().map(|s| s.token).collect();
    assert_eq!(tokens, vec!["access-token".to_string()]);
}

#[tokio::test]
async fn test_switching_accounts_ends_session() {
    let gate = signed_in();
    let mock = MockSubmitter::manual();
    let controller = sharing(&gate, &mock).await;

    controller.on_fix(LocationFix::new(1.0, 1.0, 0));
    mock.wait_for_calls(1).await;

    gate.sign_in("other-user");
    let status = wait_for(&controller, |s| s.state == SharingState::Inactive).await;
    assert_eq!(status.last_error, Some(SharingError::SessionLost));

    // The new account starts its own session, resending the known position
    controller.start().unwrap();
    mock.wait_for_calls(2).await;
    assert_eq!(mock.submitted()[1].token, "other-user");
    // Oldest held call belongs to the aborted submission
    mock.release_next(Ok(()));
    mock.release_next(Ok(()));
    let status = wait_for(&controller, |s| s.sent_count == 1).await;
    assert_eq!(status.last_sent_fix, Some(LocationFix::new(1.0, 1.0, 0)));
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_fixes_during_submission_are_coalesced() {
    let gate = signed_in();
    let mock = MockSubmitter::manual();
    let controller = sharing(&gate, &mock).await;

    controller.on_fix(LocationFix::new(0.0, 0.0, 0));
    mock.wait_for_calls(1).await;

    let skipped = LocationFix::new(0.001, 0.0, 1_000);
    let latest = LocationFix::new(0.002, 0.0, 2_000);
    controller.on_fix(skipped);
    controller.on_fix(latest);
    controller.flush().await.unwrap();
    assert_eq!(mock.call_count(), 1);

    assert!(mock.release_next(Ok(())));
    mock.wait_for_calls(2).await;
    assert_eq!(mock.submitted_fixes()[1], latest);

    assert!(mock.release_next(Ok(())));
    let status = wait_for(&controller, |s| s.sent_count == 2).await;
    assert_eq!(status.last_sent_fix, Some(latest));
    assert_eq!(mock.call_count(), 2);
    assert_eq!(mock.max_in_flight(), 1);
}

#[tokio::test]
async fn test_stop_twice_matches_stop_once() {
    let gate = signed_in();
    let mock = MockSubmitter::immediate();
    let controller = sharing(&gate, &mock).await;

    controller.on_fix(LocationFix::new(1.0, 1.0, 0));
    wait_for(&controller, |s| s.sent_count == 1).await;

    controller.stop();
    controller.flush().await.unwrap();
    let once = controller.status();

    controller.stop();
    controller.flush().await.unwrap();
    assert_eq!(controller.status(), once);
    assert_eq!(once.state, SharingState::Inactive);
    assert!(once.last_sent_fix.is_none());
    assert!(once.last_error.is_none());
}
