//! Common API types and data structures

use crate::core::LocationFix;
use crate::transport::SubmissionError;
use thiserror::Error;

/// Result type for controller operations
pub type ApiResult<T> = Result<T, PreconditionError>;

/// Synchronous rejection of `start()`; the controller stays inactive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("location permission not granted")]
    PermissionNotGranted,
    /// The session actor has shut down
    #[error("sharing controller is closed")]
    ControllerClosed,
}

/// Transient error surfaced through the observable status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharingError {
    #[error("location submission failed: {0}")]
    Submission(#[from] SubmissionError),
    /// Authentication ended while sharing; the UI should route to login
    #[error("authentication session ended")]
    SessionLost,
    #[error("location permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

/// Lifecycle state of the sharing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharingState {
    /// Not sharing; resting state
    #[default]
    Inactive,
    /// Sharing, nothing in flight
    Active,
    /// Sharing, one submission in flight
    Submitting,
}

impl SharingState {
    pub fn is_active(&self) -> bool {
        !matches!(self, SharingState::Inactive)
    }
}

/// Observable snapshot of the controller for the UI layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SharingStatus {
    pub state: SharingState,
    /// Last fix the backend accepted this session
    pub last_sent_fix: Option<LocationFix>,
    /// Wall-clock time of the last accepted submission (ms since epoch)
    pub last_sent_at_ms: Option<u64>,
    /// Most recent transient error, until dismissed
    pub last_error: Option<SharingError>,
    /// Most recent fix from the location source, shared or not
    pub last_observed_fix: Option<LocationFix>,
    pub permission_granted: bool,
    pub map_ready: bool,
    /// Successful submissions this session
    pub sent_count: u64,
    /// Failed submissions this session
    pub failed_count: u64,
}

impl SharingStatus {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SharingState::Submitting
    }
}
