//! Location submission boundary

use crate::core::LocationFix;
use crate::transport::dto::{LocationRecord, UserLocationRequest};
use crate::transport::error::SubmissionResult;
use crate::transport::http::{self, RestClient};
use async_trait::async_trait;
use tracing::debug;

/// Performs one network call persisting a fix.
///
/// Each call reports exactly one outcome. The controller never calls a
/// submitter concurrently for the same session.
#[async_trait]
pub trait LocationSubmitter: Send + Sync {
    async fn submit(&self, fix: &LocationFix, token: &str) -> SubmissionResult<()>;
}

/// Submits fixes to `POST {base_url}/{location_path}`
pub struct HttpLocationSubmitter {
    client: RestClient,
    location_path: String,
}

impl HttpLocationSubmitter {
    pub fn new(client: RestClient, location_path: impl Into<String>) -> Self {
        Self {
            client,
            location_path: location_path.into(),
        }
    }
}

#[async_trait]
impl LocationSubmitter for HttpLocationSubmitter {
    async fn submit(&self, fix: &LocationFix, token: &str) -> SubmissionResult<()> {
        let body = UserLocationRequest::from(fix);
        let response = self.client.post_json(&self.location_path, token, &body).await?;

        // The record is informational; an empty or unexpected body still counts as stored
        match http::decode::<LocationRecord>(&response) {
            Ok(record) => debug!(id = %record.id, active = record.is_active, "location stored"),
            Err(e) => debug!(error = %e, "location stored, response body not a location record"),
        }

        Ok(())
    }
}
