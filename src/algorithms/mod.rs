//! Decision algorithms for location updates

pub mod geodesy;
pub mod update_policy;

pub use geodesy::haversine_distance_m;
pub use update_policy::{UpdateDecision, UpdateDecisionPolicy, UpdatePolicyConfig};
