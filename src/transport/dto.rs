//! Wire types for the location endpoints

use crate::core::LocationFix;
use serde::{Deserialize, Serialize};

/// Body of `POST users/location`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl From<&LocationFix> for UserLocationRequest {
    fn from(fix: &LocationFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
        }
    }
}

/// Location as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: String,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    /// ISO 8601 timestamp assigned by the server
    pub timestamp: String,
    pub is_active: bool,
}
