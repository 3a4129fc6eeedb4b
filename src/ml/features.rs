use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FeatureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

const fn numeric(name: &'static str) -> FeatureSpec {
    FeatureSpec { name, kind: FeatureKind::Numeric }
}

const fn categorical(name: &'static str) -> FeatureSpec {
    FeatureSpec { name, kind: FeatureKind::Categorical }
}

pub const FEATURE_COUNT: usize = 23;

/// Columns the trained pipeline was fitted on, in training order.
pub const FEATURE_SCHEMA: [FeatureSpec; FEATURE_COUNT] = [
    numeric("Lot Frontage"),
    numeric("Lot Area"),
    categorical("Street"),
    categorical("Neighborhood"),
    categorical("Bldg Type"),
    categorical("House Style"),
    numeric("Overall Qual"),
    numeric("Overall Cond"),
    numeric("Year Built"),
    categorical("Roof Style"),
    categorical("Heating"),
    categorical("Central Air"),
    categorical("Electrical"),
    numeric("Full Bath"),
    numeric("Half Bath"),
    numeric("Bedroom AbvGr"),
    numeric("TotRms AbvGrd"),
    numeric("Gr Liv Area"),
    categorical("Functional"),
    numeric("Screen Porch"),
    numeric("Pool Area"),
    numeric("Yr Sold"),
    categorical("Sale Type"),
];

pub fn feature_names() -> Vec<&'static str> {
    FEATURE_SCHEMA.iter().map(|spec| spec.name).collect()
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_SCHEMA.iter().position(|spec| spec.name == name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
    /// Explicit `null`; the model imputes numerics and ignores categoricals.
    Missing,
}

impl FeatureValue {
    fn from_json(spec: &FeatureSpec, value: &Value) -> Result<Self, FeatureError> {
        match (spec.kind, value) {
            (_, Value::Null) => Ok(FeatureValue::Missing),
            (FeatureKind::Numeric, Value::Number(n)) => n
                .as_f64()
                .map(FeatureValue::Numeric)
                .ok_or_else(|| wrong_type(spec.name, "a number", value)),
            (FeatureKind::Categorical, Value::String(s)) => {
                Ok(FeatureValue::Categorical(s.clone()))
            }
            // Numeric category codes are matched by their decimal text.
            (FeatureKind::Categorical, Value::Number(n)) => {
                Ok(FeatureValue::Categorical(n.to_string()))
            }
            (FeatureKind::Numeric, _) => Err(wrong_type(spec.name, "a number", value)),
            (FeatureKind::Categorical, _) => Err(wrong_type(spec.name, "a string", value)),
        }
    }
}

fn wrong_type(feature: &str, expected: &'static str, value: &Value) -> FeatureError {
    FeatureError::WrongType {
        feature: feature.to_string(),
        expected,
        found: json_kind(value),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One row of model input, one slot per entry of [`FEATURE_SCHEMA`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<FeatureValue>,
}

impl FeatureVector {
    /// The constant row the simple endpoint overlays user input onto.
    pub fn defaults() -> Self {
        let values = vec![
            FeatureValue::Numeric(70.0),
            FeatureValue::Numeric(DEFAULT_LOT_AREA),
            FeatureValue::Categorical("Pave".into()),
            FeatureValue::Categorical("NAmes".into()),
            FeatureValue::Categorical("1Fam".into()),
            FeatureValue::Categorical("1Story".into()),
            FeatureValue::Numeric(DEFAULT_OVERALL_QUAL),
            FeatureValue::Numeric(5.0),
            FeatureValue::Numeric(DEFAULT_YEAR_BUILT),
            FeatureValue::Categorical("Gable".into()),
            FeatureValue::Categorical("GasA".into()),
            FeatureValue::Categorical("Y".into()),
            FeatureValue::Categorical("SBrkr".into()),
            FeatureValue::Numeric(DEFAULT_BATHROOMS),
            FeatureValue::Numeric(0.0),
            FeatureValue::Numeric(DEFAULT_BEDROOMS),
            FeatureValue::Numeric(DEFAULT_BEDROOMS + EXTRA_ROOMS),
            FeatureValue::Numeric(DEFAULT_GR_LIV_AREA),
            FeatureValue::Categorical("Typ".into()),
            FeatureValue::Numeric(0.0),
            FeatureValue::Numeric(0.0),
            FeatureValue::Numeric(2023.0),
            FeatureValue::Categorical("WD".into()),
        ];
        debug_assert_eq!(values.len(), FEATURE_COUNT);
        Self { values }
    }

    /// Validates a full-schema request object. Keys outside the schema are ignored.
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, FeatureError> {
        let values = FEATURE_SCHEMA
            .iter()
            .map(|spec| {
                let value = object
                    .get(spec.name)
                    .ok_or_else(|| FeatureError::MissingFeature(spec.name.to_string()))?;
                FeatureValue::from_json(spec, value)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { values })
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        feature_index(name).map(|idx| &self.values[idx])
    }

    pub fn value_at(&self, idx: usize) -> &FeatureValue {
        &self.values[idx]
    }

    fn set(&mut self, idx: usize, value: f64) {
        self.values[idx] = FeatureValue::Numeric(value);
    }
}

pub const DEFAULT_LOT_AREA: f64 = 10_000.0;
pub const DEFAULT_BEDROOMS: f64 = 3.0;
pub const DEFAULT_BATHROOMS: f64 = 1.0;
pub const DEFAULT_YEAR_BUILT: f64 = 1980.0;
pub const DEFAULT_OVERALL_QUAL: f64 = 5.0;
pub const DEFAULT_GR_LIV_AREA: f64 = 1500.0;

/// Rooms above grade besides bedrooms (kitchen, living, dining).
const EXTRA_ROOMS: f64 = 3.0;

// Schema slots the simple endpoint writes to.
const LOT_AREA: usize = 1;
const OVERALL_QUAL: usize = 6;
const YEAR_BUILT: usize = 8;
const FULL_BATH: usize = 13;
const BEDROOM_ABVGR: usize = 15;
const TOTRMS_ABVGRD: usize = 16;
const GR_LIV_AREA: usize = 17;

/// The six inputs of the simple endpoint. Absent fields take the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_qual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gr_liv_area: Option<f64>,
}

impl SimpleInput {
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, FeatureError> {
        let field = |name: &str| -> Result<Option<f64>, FeatureError> {
            match object.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(value @ Value::Number(n)) => n
                    .as_f64()
                    .map(Some)
                    .ok_or_else(|| wrong_type(name, "a number", value)),
                Some(value) => Err(wrong_type(name, "a number", value)),
            }
        };

        Ok(Self {
            lot_area: field("lot_area")?,
            bedrooms: field("bedrooms")?,
            bathrooms: field("bathrooms")?,
            year_built: field("year_built")?,
            overall_qual: field("overall_qual")?,
            gr_liv_area: field("gr_liv_area")?,
        })
    }

    pub fn to_feature_vector(&self) -> FeatureVector {
        let mut features = FeatureVector::defaults();
        let bedrooms = self.bedrooms.unwrap_or(DEFAULT_BEDROOMS);

        features.set(LOT_AREA, self.lot_area.unwrap_or(DEFAULT_LOT_AREA));
        features.set(OVERALL_QUAL, self.overall_qual.unwrap_or(DEFAULT_OVERALL_QUAL));
        features.set(YEAR_BUILT, self.year_built.unwrap_or(DEFAULT_YEAR_BUILT));
        features.set(FULL_BATH, self.bathrooms.unwrap_or(DEFAULT_BATHROOMS));
        features.set(BEDROOM_ABVGR, bedrooms);
        features.set(TOTRMS_ABVGRD, bedrooms + EXTRA_ROOMS);
        features.set(GR_LIV_AREA, self.gr_liv_area.unwrap_or(DEFAULT_GR_LIV_AREA));

        features
    }
}

/// A complete full-schema request body.
#[cfg(test)]
pub(crate) fn manual_house() -> Value {
    serde_json::json!({
        "Lot Frontage": 80.0,
        "Lot Area": 9605,
        "Street": "Pave",
        "Neighborhood": "SawyerW",
        "Bldg Type": "1Fam",
        "House Style": "1Story",
        "Overall Qual": 7,
        "Overall Cond": 6,
        "Year Built": 2000,
        "Roof Style": "Gable",
        "Heating": "GasA",
        "Central Air": "Y",
        "Electrical": "SBrkr",
        "Full Bath": 2,
        "Half Bath": 1,
        "Bedroom AbvGr": 3,
        "TotRms AbvGrd": 6,
        "Gr Liv Area": 1800,
        "Functional": "Typ",
        "Screen Porch": 0,
        "Pool Area": 0,
        "Yr Sold": 2009,
        "Sale Type": "WD"
    })
}
