use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::ModelError;
use super::features::FeatureVector;
use super::models::ModelMetadata;
use super::RegressionModel;

/// Process-wide prediction front end. The model is loaded once and only read
/// afterwards, so the engine is shared behind an `Arc` without locking.
pub struct PricingEngine {
    model: Arc<RegressionModel>,
    model_path: String,
    loaded_at: DateTime<Utc>,
}

impl PricingEngine {
    pub async fn new(config: &ModelConfig) -> Result<Self> {
        let model = RegressionModel::load_from_file(&config.path).await?;

        info!(
            "Pricing engine initialized with {} ({})",
            model.metadata.name, model.metadata.model_type
        );

        Ok(Self::from_model(model, &config.path))
    }

    pub fn from_model(model: RegressionModel, model_path: impl Into<String>) -> Self {
        Self {
            model: Arc::new(model),
            model_path: model_path.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Sale price in dollars, rounded to cents.
    pub fn predict_price(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let raw = self.model.predict(features)?;
        let price = round_to_cents(self.model.target_transform.invert(raw));

        // Cent rounding scales by 100 and can overflow a finite price.
        if !price.is_finite() {
            return Err(ModelError::InferenceError(format!(
                "inverse transform of {} overflowed",
                raw
            )));
        }

        debug!("Predicted {} (raw output {:.6})", price, raw);
        Ok(price)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.model.metadata
    }

    pub fn model_name(&self) -> &str {
        &self.model.metadata.name
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
