//! Incident endpoints

use crate::auth::AuthGate;
use crate::incidents::types::{Incident, IncidentRequest};
use crate::transport::http::{self, RestClient, RestError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Search radius for nearby incidents when none is given (meters)
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncidentError {
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error("incident title is required")]
    BlankTitle,
    #[error("incident {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Request(#[from] RestError),
}

/// Client for reporting and querying incidents
pub struct IncidentClient {
    client: RestClient,
    auth: Arc<dyn AuthGate>,
}

impl IncidentClient {
    pub fn new(client: RestClient, auth: Arc<dyn AuthGate>) -> Self {
        Self { client, auth }
    }

    fn token(&self) -> Result<String, IncidentError> {
        if !self.auth.is_authenticated() {
            return Err(IncidentError::NotAuthenticated);
        }
        self.auth.access_token().ok_or(IncidentError::NotAuthenticated)
    }

    /// Report a new incident
    pub async fn create_incident(&self, request: &IncidentRequest) -> Result<Incident, IncidentError> {
        if request.title.trim().is_empty() {
            return Err(IncidentError::BlankTitle);
        }
        let token = self.token()?;
        debug!(title = %request.title, "reporting incident");
        let body = self.client.post_json("incidents", &token, request).await?;
        let incident: Incident = http::decode(&body)?;
        info!(id = %incident.id, "incident reported");
        Ok(incident)
    }

    /// Incidents within `radius_m` of a position
    pub async fn incidents_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: Option<f64>,
    ) -> Result<Vec<Incident>, IncidentError> {
        let token = self.token()?;
        let query = [
            ("lat", latitude.to_string()),
            ("lng", longitude.to_string()),
            ("radius", radius_m.unwrap_or(DEFAULT_NEARBY_RADIUS_M).to_string()),
        ];
        let body = self.client.get("incidents/nearby", &token, &query).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let incidents: Vec<Incident> = http::decode(&body)?;
        debug!(count = incidents.len(), "nearby incidents");
        Ok(incidents)
    }

    /// A single incident by id
    pub async fn incident_by_id(&self, id: &str) -> Result<Incident, IncidentError> {
        let token = self.token()?;
        let path = format!("incidents/{}", id);
        match self.client.get(&path, &token, &[]).await {
            Ok(body) => Ok(http::decode(&body)?),
            Err(RestError::Status { status: 404, .. }) => Err(IncidentError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionAuthGate;
    use crate::core::LocationFix;
    use crate::utils::config::ApiEndpointConfig;

    fn client(gate: SessionAuthGate) -> IncidentClient {
        let rest = RestClient::new(&ApiEndpointConfig::default()).unwrap();
        IncidentClient::new(rest, Arc::new(gate))
    }

    #[tokio::test]
    async fn test_requires_session_before_any_request() {
        let client = client(SessionAuthGate::new());
        assert_eq!(
            client.incidents_nearby(3.45, -76.53, None).await,
            Err(IncidentError::NotAuthenticated)
        );
        assert_eq!(
            client.incident_by_id("i-1").await.unwrap_err(),
            IncidentError::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_blank_title_rejected_before_sending() {
        let client = client(SessionAuthGate::authenticated("token"));
        let fix = LocationFix::new(3.45, -76.53, 0);
        for title in ["", "   \t"] {
            assert_eq!(
                client.create_incident(&IncidentRequest::at(&fix, title)).await,
                Err(IncidentError::BlankTitle)
            );
        }
    }
}
