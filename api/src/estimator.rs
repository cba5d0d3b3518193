//! The demand model, held once for the process lifetime.

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{ApiError, ModelError};
use crate::features::FeatureVector;
use crate::model::{FeatureFrame, FeatureValue, Regressor, TreeEnsemble};
use crate::schema::LocationId;

/// Column layout the model was trained with, in order.
pub const TRAINING_COLUMNS: [&str; 5] = [
    "PULocationID",
    "hour",
    "day_of_week",
    "day_of_month",
    "month",
];

/// Wraps an optional loaded model. Without one, every estimate fails with
/// `ApiError::ServiceUnavailable`.
#[derive(Clone)]
pub struct DemandEstimator {
    model: Option<Arc<dyn Regressor>>,
}

impl DemandEstimator {
    pub fn new(model: Arc<dyn Regressor>) -> Self {
        Self { model: Some(model) }
    }

    pub fn unavailable() -> Self {
        Self { model: None }
    }

    /// Load a tree ensemble from `path`. A failure is logged and leaves the
    /// estimator unavailable rather than aborting startup.
    pub fn load(path: &Path) -> Self {
        match TreeEnsemble::from_path(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    trees = model.trees.len(),
                    "Model loaded successfully"
                );
                Self::new(Arc::new(model))
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error loading model");
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn estimate(&self, features: &FeatureVector) -> Result<f64, ApiError> {
        let model = self.model.as_ref().ok_or(ApiError::ServiceUnavailable)?;

        let predictions = model.predict(&to_frame(features))?;
        let demand = *predictions.first().ok_or(ModelError::EmptyOutput)?;
        if !demand.is_finite() {
            return Err(ModelError::NonFinite(demand).into());
        }
        Ok(demand)
    }
}

/// Single-row frame in training-column order.
fn to_frame(features: &FeatureVector) -> FeatureFrame {
    let location = match &features.location_id {
        LocationId::Number(n) => match n.as_f64() {
            Some(v) => FeatureValue::Number(v),
            None => FeatureValue::Text(n.to_string()),
        },
        LocationId::Text(s) => FeatureValue::Text(s.clone()),
        LocationId::Bool(b) => FeatureValue::Number(if *b { 1.0 } else { 0.0 }),
    };

    FeatureFrame {
        columns: TRAINING_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: vec![vec![
            location,
            FeatureValue::Number(features.hour as f64),
            FeatureValue::Number(features.day_of_week as f64),
            FeatureValue::Number(features.day_of_month as f64),
            FeatureValue::Number(features.month as f64),
        ]],
    }
}
