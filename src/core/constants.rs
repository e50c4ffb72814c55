//! Geodesy constants and update policy defaults

/// Mean Earth radius used by the haversine distance (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum movement that always warrants a send (meters)
pub const DEFAULT_MIN_DISTANCE_M: f64 = 10.0;

/// Heartbeat interval after which a fix is sent even without movement (milliseconds)
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 30_000;
