//! Live Location Sharing
//!
//! Decides when a device position is worth sending to the backend and
//! coordinates the asynchronous submissions: at most one in flight, only the
//! latest waiting fix kept, and sharing torn down when authentication ends.

pub mod core;
pub mod algorithms;
pub mod api;
pub mod auth;
pub mod source;
pub mod transport;
pub mod incidents;
pub mod utils;
pub mod logging;

// Re-export commonly used types
pub use core::{LocationFix, EARTH_RADIUS_M};
pub use algorithms::{haversine_distance_m, UpdateDecision, UpdateDecisionPolicy, UpdatePolicyConfig};
pub use api::{
    ApiResult, Observable, PreconditionError, SharingController, SharingError, SharingState,
    SharingStatus,
};
pub use auth::{AuthGate, AuthSession, AuthStatus, SessionAuthGate};
pub use source::{LocationRequest, LocationSource, ReplaySource, SourceError, SourceEvent};
pub use transport::{
    HttpLocationSubmitter, LocationSubmitter, MockSubmitter, RestClient, SubmissionError,
    SubmissionResult,
};
pub use incidents::{Incident, IncidentClient, IncidentError, IncidentRequest};
pub use utils::config::{ConfigurationManager, SharingConfig};
