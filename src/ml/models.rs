use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use super::features::{
    feature_index, FeatureKind, FeatureValue, FeatureVector, FEATURE_COUNT, FEATURE_SCHEMA,
};
use crate::error::ModelError;

/// How the training target was transformed before fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// `ln(1 + y)`, inverted with `exp(p) - 1`.
    Log1p,
    Identity,
}

impl TargetTransform {
    pub fn invert(&self, prediction: f64) -> f64 {
        match self {
            TargetTransform::Log1p => prediction.exp_m1(),
            TargetTransform::Identity => prediction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub model_type: String,
    pub target: String,
    pub performance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericTerm {
    pub name: String,
    /// Replaces a `null` input (training median).
    pub impute: f64,
    pub mean: f64,
    pub scale: f64,
    pub coef: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalTerm {
    pub name: String,
    /// One-hot coefficients by category. Unseen categories contribute nothing.
    #[serde(default)]
    pub coefs: HashMap<String, f64>,
}

/// On-disk form of a fitted standardize/one-hot/ElasticNet pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub target_transform: TargetTransform,
    pub intercept: f64,
    pub numeric: Vec<NumericTerm>,
    pub categorical: Vec<CategoricalTerm>,
}

/// A loaded linear model. Immutable once built.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    pub metadata: ModelMetadata,
    pub target_transform: TargetTransform,
    intercept: f64,
    numeric_slots: Vec<usize>,
    impute: DVector<f64>,
    means: DVector<f64>,
    scales: DVector<f64>,
    coefs: DVector<f64>,
    categorical: Vec<(usize, HashMap<String, f64>)>,
}

impl RegressionModel {
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        info!("Loading regression model from {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ModelError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .map_err(|e| ModelError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        Self::from_artifact(artifact)
    }

    /// Checks the artifact against the feature schema and packs the numeric
    /// parameters into vectors.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if !artifact.intercept.is_finite() {
            return Err(ModelError::InvalidArtifact("intercept is not finite".into()));
        }

        let mut seen = HashSet::new();
        let mut slot_for = |name: &str, kind: FeatureKind| -> Result<usize, ModelError> {
            let idx = feature_index(name)
                .ok_or_else(|| ModelError::InvalidArtifact(format!("unknown feature '{}'", name)))?;
            if FEATURE_SCHEMA[idx].kind != kind {
                return Err(ModelError::InvalidArtifact(format!(
                    "feature '{}' is {:?} in the schema but {:?} in the artifact",
                    name, FEATURE_SCHEMA[idx].kind, kind
                )));
            }
            if !seen.insert(idx) {
                return Err(ModelError::InvalidArtifact(format!(
                    "feature '{}' appears twice",
                    name
                )));
            }
            Ok(idx)
        };

        let mut numeric_slots = Vec::with_capacity(artifact.numeric.len());
        for term in &artifact.numeric {
            numeric_slots.push(slot_for(&term.name, FeatureKind::Numeric)?);
            let params = [term.impute, term.mean, term.scale, term.coef];
            if params.iter().any(|p| !p.is_finite()) || term.scale == 0.0 {
                return Err(ModelError::InvalidArtifact(format!(
                    "feature '{}' has a non-finite parameter or zero scale",
                    term.name
                )));
            }
        }

        let mut categorical = Vec::with_capacity(artifact.categorical.len());
        for term in artifact.categorical {
            let idx = slot_for(&term.name, FeatureKind::Categorical)?;
            if term.coefs.values().any(|c| !c.is_finite()) {
                return Err(ModelError::InvalidArtifact(format!(
                    "feature '{}' has a non-finite coefficient",
                    term.name
                )));
            }
            categorical.push((idx, term.coefs));
        }

        if seen.len() != FEATURE_COUNT {
            let missing: Vec<&str> = FEATURE_SCHEMA
                .iter()
                .enumerate()
                .filter(|(idx, _)| !seen.contains(idx))
                .map(|(_, spec)| spec.name)
                .collect();
            return Err(ModelError::InvalidArtifact(format!(
                "missing features: {}",
                missing.join(", ")
            )));
        }

        let column = |f: fn(&NumericTerm) -> f64| {
            DVector::from_iterator(artifact.numeric.len(), artifact.numeric.iter().map(f))
        };

        Ok(Self {
            impute: column(|t| t.impute),
            means: column(|t| t.mean),
            scales: column(|t| t.scale),
            coefs: column(|t| t.coef),
            metadata: artifact.metadata,
            target_transform: artifact.target_transform,
            intercept: artifact.intercept,
            numeric_slots,
            categorical,
        })
    }

    /// Raw model output, still on the transformed target scale.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        debug!("Running regression inference");

        let mut x = self.impute.clone();
        for (row, &slot) in self.numeric_slots.iter().enumerate() {
            match features.value_at(slot) {
                FeatureValue::Numeric(v) => x[row] = *v,
                FeatureValue::Missing => {}
                FeatureValue::Categorical(v) => {
                    return Err(ModelError::InferenceError(format!(
                        "feature '{}' expects a number, got category '{}'",
                        FEATURE_SCHEMA[slot].name, v
                    )));
                }
            }
        }

        let standardized = (x - &self.means).component_div(&self.scales);
        let mut y = self.intercept + self.coefs.dot(&standardized);

        for (slot, coefs) in &self.categorical {
            match features.value_at(*slot) {
                FeatureValue::Categorical(v) => y += coefs.get(v).copied().unwrap_or(0.0),
                FeatureValue::Missing => {}
                FeatureValue::Numeric(v) => {
                    return Err(ModelError::InferenceError(format!(
                        "feature '{}' expects a category, got number {}",
                        FEATURE_SCHEMA[*slot].name, v
                    )));
                }
            }
        }

        if !y.is_finite() {
            return Err(ModelError::InferenceError(format!(
                "model produced non-finite output {}",
                y
            )));
        }

        Ok(y)
    }
}

/// Artifact over the full schema where every coefficient is zero except the
/// ones a test sets. Numeric terms use mean 0 and scale 1.
#[cfg(test)]
pub(crate) fn fixture_artifact(intercept: f64) -> ModelArtifact {
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for spec in FEATURE_SCHEMA.iter() {
        match spec.kind {
            FeatureKind::Numeric => numeric.push(NumericTerm {
                name: spec.name.to_string(),
                impute: 0.0,
                mean: 0.0,
                scale: 1.0,
                coef: 0.0,
            }),
            FeatureKind::Categorical => categorical.push(CategoricalTerm {
                name: spec.name.to_string(),
                coefs: HashMap::new(),
            }),
        }
    }

    ModelArtifact {
        metadata: ModelMetadata {
            name: "fixture_regression".into(),
            model_type: "ElasticNet Regression".into(),
            target: "SalePrice (USD)".into(),
            performance: "RMSE: 0.0 (fixture)".into(),
        },
        target_transform: TargetTransform::Log1p,
        intercept,
        numeric,
        categorical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::features::SimpleInput;
    use std::io::Write;

    fn numeric_term<'a>(artifact: &'a mut ModelArtifact, name: &str) -> &'a mut NumericTerm {
        artifact.numeric.iter_mut().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn predicts_intercept_for_zero_coefficients() {
        let model = RegressionModel::from_artifact(fixture_artifact(11.5)).unwrap();
        let y = model.predict(&FeatureVector::defaults()).unwrap();
        assert!((y - 11.5).abs() < 1e-12);
    }

    #[test]
    fn standardizes_numeric_features() {
        let mut artifact = fixture_artifact(10.0);
        let term = numeric_term(&mut artifact, "Gr Liv Area");
        term.mean = 1000.0;
        term.scale = 500.0;
        term.coef = 0.2;

        let model = RegressionModel::from_artifact(artifact).unwrap();
        let features = SimpleInput {
            gr_liv_area: Some(2000.0),
            ..Default::default()
        }
        .to_feature_vector();

        // (2000 - 1000) / 500 * 0.2
        let y = model.predict(&features).unwrap();
        assert!((y - 10.4).abs() < 1e-12);
    }

    #[test]
    fn one_hot_ignores_unseen_categories() {
        let mut artifact = fixture_artifact(10.0);
        let neighborhood = artifact
            .categorical
            .iter_mut()
            .find(|t| t.name == "Neighborhood")
            .unwrap();
        neighborhood.coefs.insert("NAmes".into(), -0.25);
        let model = RegressionModel::from_artifact(artifact).unwrap();

        let mut house = crate::ml::features::manual_house();
        house["Neighborhood"] = "NAmes".into();
        let known = FeatureVector::from_json(house.as_object().unwrap()).unwrap();
        house["Neighborhood"] = "Atlantis".into();
        let unseen = FeatureVector::from_json(house.as_object().unwrap()).unwrap();

        assert!((model.predict(&known).unwrap() - 9.75).abs() < 1e-12);
        assert!((model.predict(&unseen).unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn null_category_contributes_nothing() {
        let mut artifact = fixture_artifact(10.0);
        let neighborhood = artifact
            .categorical
            .iter_mut()
            .find(|t| t.name == "Neighborhood")
            .unwrap();
        neighborhood.coefs.insert("NAmes".into(), -0.25);
        let model = RegressionModel::from_artifact(artifact).unwrap();

        let mut house = crate::ml::features::manual_house();
        house["Neighborhood"] = serde_json::Value::Null;
        let features = FeatureVector::from_json(house.as_object().unwrap()).unwrap();

        assert_eq!(features.get("Neighborhood"), Some(&FeatureValue::Missing));
        assert_eq!(model.predict(&features).unwrap(), 10.0);
    }

    #[test]
    fn null_numeric_uses_imputation_value() {
        let mut artifact = fixture_artifact(0.0);
        let term = numeric_term(&mut artifact, "Lot Frontage");
        term.impute = 70.0;
        term.coef = 0.01;
        let model = RegressionModel::from_artifact(artifact).unwrap();

        let mut house = crate::ml::features::manual_house();
        house["Lot Frontage"] = serde_json::Value::Null;
        let features = FeatureVector::from_json(house.as_object().unwrap()).unwrap();

        assert!((model.predict(&features).unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn rejects_artifact_missing_a_feature() {
        let mut artifact = fixture_artifact(10.0);
        artifact.categorical.retain(|t| t.name != "Sale Type");
        let err = RegressionModel::from_artifact(artifact).unwrap_err();
        assert!(err.to_string().contains("Sale Type"), "{}", err);
    }

    #[test]
    fn rejects_duplicate_and_unknown_features() {
        let mut artifact = fixture_artifact(10.0);
        let dup = artifact.numeric[0].clone();
        artifact.numeric.push(dup);
        assert!(matches!(
            RegressionModel::from_artifact(artifact),
            Err(ModelError::InvalidArtifact(_))
        ));

        let mut artifact = fixture_artifact(10.0);
        artifact.numeric[0].name = "Garage Cars".into();
        assert!(matches!(
            RegressionModel::from_artifact(artifact),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn rejects_zero_scale() {
        let mut artifact = fixture_artifact(10.0);
        numeric_term(&mut artifact, "Pool Area").scale = 0.0;
        assert!(matches!(
            RegressionModel::from_artifact(artifact),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn rejects_kind_mismatch() {
        let mut artifact = fixture_artifact(10.0);
        let street = artifact.categorical.remove(0);
        artifact.numeric.push(NumericTerm {
            name: street.name,
            impute: 0.0,
            mean: 0.0,
            scale: 1.0,
            coef: 0.0,
        });
        assert!(matches!(
            RegressionModel::from_artifact(artifact),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn log1p_inverts_with_exp_m1() {
        let y = 12.0_f64;
        assert!((TargetTransform::Log1p.invert(y) - (y.exp() - 1.0)).abs() < 1e-6);
        assert_eq!(TargetTransform::Identity.invert(y), y);
    }

    #[tokio::test]
    async fn loads_artifact_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&fixture_artifact(12.0)).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let model = RegressionModel::load_from_file(file.path()).await.unwrap();
        assert_eq!(model.metadata.name, "fixture_regression");
        assert_eq!(model.target_transform, TargetTransform::Log1p);
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let err = RegressionModel::load_from_file("does/not/exist.json")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ModelLoadError(_)));
    }

    #[tokio::test]
    async fn shipped_artifact_matches_schema() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("models/house_price/saved_model/elastic_net_regression.json");
        let model = RegressionModel::load_from_file(&path).await.unwrap();

        assert_eq!(model.metadata.name, "elastic_net_regression");
        let price = model
            .target_transform
            .invert(model.predict(&FeatureVector::defaults()).unwrap());
        assert!(price > 50_000.0 && price < 1_000_000.0, "price {}", price);
    }
}
