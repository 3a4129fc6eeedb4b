use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::ml::SimpleInput;
use crate::web::responses::{ErrorResponse, SimplePredictionResponse};

/// HTTP client for the prediction service. Every call is bounded by the
/// configured timeout.
#[derive(Clone)]
pub struct DashboardClient {
    http_client: HttpClient,
    base_url: String,
}

impl DashboardClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Other(e.to_string()))?;

        info!("Dashboard client targeting {}", config.base_url);

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn predict_simple(
        &self,
        input: &SimpleInput,
    ) -> Result<SimplePredictionResponse, ClientError> {
        let url = format!("{}/predict/simple", self.base_url);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(input)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&self.base_url, e))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(ClientError::Status { status, message });
        }

        response
            .json::<SimplePredictionResponse>()
            .await
            .map_err(|e| ClientError::from_reqwest(&self.base_url, e))
    }
}
