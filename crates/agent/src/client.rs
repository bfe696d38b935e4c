use godfield_core::api::{DecideRequest, Decision};
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Failure of one decide round trip.
#[derive(Debug, Error)]
pub enum DecideError {
    #[error("decide transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decide returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("decide response did not parse: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Boundary to the external decision service.
#[derive(Debug, Clone)]
pub struct DecisionClient {
    http: Client,
    url: String,
}

impl DecisionClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One round trip. No retries: the gate re-triggers on a later tick if
    /// the scene still warrants it.
    pub async fn decide(&self, req: &DecideRequest) -> Result<Decision, DecideError> {
        let resp = self.http.post(&self.url).json(req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(DecideError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
