//! Core data types for location sharing

use serde::{Deserialize, Serialize};

/// A single device position report.
///
/// Fixes are plain values: they are copied into the controller, compared by the
/// update policy and handed to the submitter, but never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, if the device reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Device-supplied timestamp (milliseconds)
    pub timestamp_ms: u64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp_ms,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy = Some(accuracy_m);
        self
    }

    /// Great-circle distance to another fix in meters
    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        crate::algorithms::geodesy::haversine_distance_m(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        )
    }

    /// Milliseconds elapsed since `earlier`; zero if the clock went backwards
    pub fn elapsed_since(&self, earlier: &LocationFix) -> u64 {
        self.timestamp_ms.saturating_sub(earlier.timestamp_ms)
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}
