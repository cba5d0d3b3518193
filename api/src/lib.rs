//! Demand prediction and surge pricing service.
//!
//! A request names a location and, optionally, a point in time. Calendar
//! features are derived from the timestamp, a pre-trained regression model
//! estimates demand, and the estimate selects a price multiplier.

pub mod app;
pub mod config;
pub mod error;
pub mod estimator;
pub mod features;
pub mod handler;
pub mod model;
pub mod pricing;
pub mod schema;
pub mod service;

pub use error::{ApiError, ModelError, ModelLoadError, ValidationError};
pub use estimator::DemandEstimator;
pub use features::{FeatureExtractor, FeatureVector};
pub use model::{FeatureFrame, FeatureValue, Regressor, TreeEnsemble};
pub use pricing::{PriceTier, PricingPolicy, PricingResult};
pub use service::PredictionService;
