use std::time::Duration;

use serde::Serialize;

use crate::{
    core::types::{ErrorBody, QueryResponse},
    error::{AppError, AppResult},
};

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    sql: &'a str,
}

/// Client for the console service's single endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// User-initiated run: POST the statement as the request body.
    pub async fn submit(&self, sql: &str) -> AppResult<QueryResponse> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&SubmitBody { sql })
            .send()
            .await?;
        decode(resp).await
    }

    /// Timer-driven run: body-less GET, the service re-runs its last query.
    pub async fn refresh(&self) -> AppResult<QueryResponse> {
        let resp = self.client.get(&self.endpoint).send().await?;
        decode(resp).await
    }
}

async fn decode(resp: reqwest::Response) -> AppResult<QueryResponse> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        // The service reports failures as {"error": "..."}; anything else
        // degrades to the HTTP status line, like a browser's statusText.
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string())
            });
        return Err(AppError::Backend(message));
    }

    serde_json::from_str(&body).map_err(|e| AppError::BadResponse(e.to_string()))
}
