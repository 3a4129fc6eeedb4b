use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::responses::{
    HealthResponse, ModelInfoResponse, PredictionResponse, SimplePredictionResponse, SERVICE_NAME,
};
use crate::config::ServerConfig;
use crate::error::{ApiError, FeatureError};
use crate::ml::features::feature_names;
use crate::ml::{FeatureVector, PricingEngine, SimpleInput};

#[derive(Clone)]
pub struct ApiServer {
    engine: Arc<PricingEngine>,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(engine: Arc<PricingEngine>, config: &ServerConfig) -> Self {
        Self {
            engine,
            config: config.clone(),
        }
    }

    pub fn router(&self) -> Router {
        build_router(
            self.engine.clone(),
            Duration::from_secs(self.config.request_timeout_seconds),
        )
    }

    /// Serves until Ctrl-C.
    pub async fn start(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Prediction service listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Prediction service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, draining connections...");
    }
}

pub fn build_router(engine: Arc<PricingEngine>, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/", get(health_check))
        .route("/predict", post(predict_house_price))
        .route("/predict/simple", post(predict_simple))
        .route("/model/info", get(model_info));

    with_service_layers(routes, request_timeout).with_state(engine)
}

/// Slow requests are answered with 408 once `request_timeout` elapses.
fn with_service_layers<S>(router: Router<S>, request_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

fn is_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// A prediction body must be a non-empty JSON object sent as
/// `application/json`.
fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<Map<String, Value>, FeatureError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FeatureError::EmptyBody);
    }

    if !is_json_content(headers) {
        return Err(FeatureError::NotJson);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if map.is_empty() => Err(FeatureError::EmptyBody),
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Err(FeatureError::EmptyBody),
        Ok(_) => Err(FeatureError::NotAnObject),
        Err(e) => Err(FeatureError::MalformedJson(e.to_string())),
    }
}

// API Handlers
async fn health_check(State(engine): State<Arc<PricingEngine>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
        model: engine.model_name().to_string(),
    })
}

async fn predict_house_price(
    State(engine): State<Arc<PricingEngine>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let input = parse_body(&headers, &body)?;
    let features = FeatureVector::from_json(&input)?;
    let predicted_price = engine.predict_price(&features)?;

    debug!("Full prediction: {}", predicted_price);

    Ok(Json(PredictionResponse {
        predicted_price,
        model: engine.model_name().to_string(),
        timestamp: Utc::now(),
        input_features: Value::Object(input),
    }))
}

async fn predict_simple(
    State(engine): State<Arc<PricingEngine>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SimplePredictionResponse>, ApiError> {
    let input = parse_body(&headers, &body)?;
    let simple = SimpleInput::from_json(&input)?;
    let predicted_price = engine.predict_price(&simple.to_feature_vector())?;

    debug!("Simple prediction for {:?}: {}", simple, predicted_price);

    Ok(Json(SimplePredictionResponse {
        predicted_price,
        simplified_input: Value::Object(input),
        timestamp: Utc::now(),
    }))
}

async fn model_info(State(engine): State<Arc<PricingEngine>>) -> Json<ModelInfoResponse> {
    let metadata = engine.metadata();

    Json(ModelInfoResponse {
        model_type: metadata.model_type.clone(),
        model_path: engine.model_path().to_string(),
        features_required: feature_names().into_iter().map(String::from).collect(),
        target: metadata.target.clone(),
        performance: metadata.performance.clone(),
        last_updated: engine.loaded_at(),
    })
}
