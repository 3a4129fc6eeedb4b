use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::web::responses::ErrorResponse;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model loading failed: {0}")]
    ModelLoadError(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Inference failed: {0}")]
    InferenceError(String),
}

/// Request bodies that cannot be turned into a feature vector.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("No input data provided")]
    EmptyBody,

    #[error("Request body must be sent as application/json")]
    NotJson,

    #[error("Request body is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Input data must be a JSON object")]
    NotAnObject,

    #[error("Missing required feature: {0}")]
    MissingFeature(String),

    #[error("Feature '{feature}' must be {expected}, got {found}")]
    WrongType {
        feature: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Everything a prediction endpoint can fail with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] FeatureError),

    #[error(transparent)]
    Inference(#[from] ModelError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(e) => {
                warn!("Rejected prediction request: {}", e);
                ErrorResponse {
                    error: e.to_string(),
                    message: Some("Invalid input data".to_string()),
                }
            }
            ApiError::Inference(e) => {
                // The cause stays in the logs.
                error!("Prediction failed: {}", e);
                ErrorResponse {
                    error: "Error making prediction".to_string(),
                    message: Some("The model could not score this input".to_string()),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Could not connect to the prediction service at {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Prediction service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Other(String),
}

impl ClientError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ClientError::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            ClientError::Other(err.to_string())
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}
