//! Incident reporting against the REST backend
//!
//! Users report safety incidents at their position and view incidents near
//! them on the map. Rendering and severity colouring live in the UI layer.

pub mod types;
pub mod client;

pub use types::{Incident, IncidentCategory, IncidentRequest, IncidentSeverity, IncidentStatus};
pub use client::{IncidentClient, IncidentError, DEFAULT_NEARBY_RADIUS_M};
