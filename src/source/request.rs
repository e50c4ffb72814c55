//! Device location request parameters

use crate::core::LocationFix;
use serde::{Deserialize, Serialize};

/// Cadence asked of the positioning API
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRequest {
    /// Nominal update interval (milliseconds)
    pub interval_ms: u64,
    /// Never deliver faster than this (milliseconds)
    pub fastest_interval_ms: u64,
    /// Movement the device should see before reporting (meters)
    pub min_update_distance_m: f64,
    /// Longest the device may batch fixes before delivering (milliseconds)
    pub max_update_delay_ms: u64,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            fastest_interval_ms: 5_000,
            min_update_distance_m: 5.0,
            max_update_delay_ms: 15_000,
        }
    }
}

impl LocationRequest {
    /// Whether `candidate` may be delivered after `previous` under the fastest interval
    pub fn admits(&self, previous: Option<&LocationFix>, candidate: &LocationFix) -> bool {
        match previous {
            Some(previous) => candidate.elapsed_since(previous) >= self.fastest_interval_ms,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = LocationRequest::default();
        assert_eq!(request.interval_ms, 10_000);
        assert_eq!(request.fastest_interval_ms, 5_000);
        assert_eq!(request.min_update_distance_m, 5.0);
        assert_eq!(request.max_update_delay_ms, 15_000);
    }

    #[test]
    fn test_admits_respects_fastest_interval() {
        let request = LocationRequest::default();
        let first = LocationFix::new(0.0, 0.0, 0);
        assert!(request.admits(None, &first));
        assert!(!request.admits(Some(&first), &LocationFix::new(0.0, 0.0, 4_999)));
        assert!(request.admits(Some(&first), &LocationFix::new(0.0, 0.0, 5_000)));
    }
}
