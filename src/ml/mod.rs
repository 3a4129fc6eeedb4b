pub mod engine;
pub mod features;
pub mod models;

pub use engine::PricingEngine;
pub use features::{FeatureVector, SimpleInput};
pub use models::RegressionModel;
