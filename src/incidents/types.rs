//! Incident wire types

use crate::core::LocationFix;
use serde::{Deserialize, Serialize};

/// Radius an incident covers when the reporter does not choose one (meters)
pub const DEFAULT_INCIDENT_RADIUS_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentCategory {
    Accident,
    Crime,
    Emergency,
    NaturalDisaster,
    Infrastructure,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Active,
    Resolved,
    Expired,
    /// Confirmed by enough nearby users
    Verified,
}

/// Body of `POST incidents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: IncidentSeverity,
    pub category: IncidentCategory,
    /// Area the incident affects (meters)
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl IncidentRequest {
    /// Report at the given fix with default severity, category and radius
    pub fn at(fix: &LocationFix, title: impl Into<String>) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            address: None,
            title: title.into(),
            description: None,
            severity: IncidentSeverity::default(),
            category: IncidentCategory::default(),
            radius: DEFAULT_INCIDENT_RADIUS_M,
            image_urls: None,
            audio_url: None,
        }
    }

    /// Attach a description; blank text leaves it unset
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_severity(mut self, severity: IncidentSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: IncidentCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius = radius_m;
        self
    }
}

/// Incident as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub reporter_id: String,
    pub reporter_email: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub severity: IncidentSeverity,
    pub category: IncidentCategory,
    pub status: IncidentStatus,
    /// ISO 8601 timestamps
    pub created_at: String,
    pub updated_at: String,
    pub expires_at: String,
    pub confirmation_count: u32,
    pub denial_count: u32,
    pub radius: f64,
    /// 0-100, drives the overlay intensity on the map
    pub intensity_level: f64,
    pub last_confirmation_at: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub audio_url: Option<String>,
    /// Distance to the requesting user, when the query had a position
    pub distance: Option<f64>,
    pub user_has_confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_and_casing() {
        let fix = LocationFix::new(3.4516, -76.532, 0);
        let request = IncidentRequest::at(&fix, "Flooded street")
            .with_category(IncidentCategory::NaturalDisaster)
            .with_severity(IncidentSeverity::High);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["radius"], 100.0);
        assert_eq!(json["category"], "NATURAL_DISASTER");
        assert_eq!(json["severity"], "HIGH");
        assert!(json.get("imageUrls").is_none());
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let fix = LocationFix::new(3.4516, -76.532, 0);
        let request = IncidentRequest::at(&fix, "Pothole").with_description("  ");
        assert_eq!(request.description, None);
        assert!(serde_json::to_value(&request).unwrap().get("description").is_none());

        let request = request.with_description("Deep one");
        assert_eq!(request.description.as_deref(), Some("Deep one"));
    }

    #[test]
    fn test_incident_from_backend() {
        let incident: Incident = serde_json::from_str(
            r#"{
                "id": "i-1", "reporterId": "u-1", "reporterEmail": "a@b.co",
                "latitude": 3.45, "longitude": -76.53, "address": null,
                "title": "Crash", "description": "Two cars", "severity": "CRITICAL",
                "category": "ACCIDENT", "status": "ACTIVE",
                "createdAt": "2024-05-01T10:00:00", "updatedAt": "2024-05-01T10:00:00",
                "expiresAt": "2024-05-01T12:00:00", "confirmationCount": 3, "denialCount": 0,
                "radius": 100.0, "intensityLevel": 72.5, "lastConfirmationAt": null,
                "imageUrls": null, "audioUrl": null, "distance": 240.0, "userHasConfirmed": false
            }"#,
        )
        .unwrap();
        assert_eq!(incident.severity, IncidentSeverity::Critical);
        assert_eq!(incident.status, IncidentStatus::Active);
        assert_eq!(incident.distance, Some(240.0));
    }
}
