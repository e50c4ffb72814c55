//! Async REST client shared by the location and incident endpoints

use crate::utils::config::ApiEndpointConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

const USER_AGENT: &str = concat!("location-share/", env!("CARGO_PKG_VERSION"));

/// Failure talking to the REST backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for RestError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RestError::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            RestError::Status {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            RestError::Transport(error.to_string())
        }
    }
}

/// Thin reqwest wrapper that attaches the bearer token to every call
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ApiEndpointConfig) -> Result<Self, RestError> {
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(RestError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RestError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a relative endpoint path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the raw response body
    pub async fn post_json<B>(&self, path: &str, token: &str, body: &B) -> Result<String, RestError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::read_body(response).await
    }

    /// GET with query parameters and return the raw response body
    pub async fn get(
        &self,
        path: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<String, RestError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn read_body(response: reqwest::Response) -> Result<String, RestError> {
        let status = response.status();
        let body = response.text().await?;
        trace!(status = status.as_u16(), len = body.len(), "response");

        if !status.is_success() {
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            };
            return Err(RestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

/// Decode a JSON response body
pub fn decode<R: DeserializeOwned>(body: &str) -> Result<R, RestError> {
    serde_json::from_str(body).map_err(|e| RestError::Decode(e.to_string()))
}
