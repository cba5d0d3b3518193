//! Request orchestration: validate, extract, estimate, price.

use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result, ValidationError};
use crate::estimator::DemandEstimator;
use crate::features::{Clock, FeatureExtractor, SystemClock};
use crate::pricing::{round2, PricingPolicy};
use crate::schema::{PredictionRequest, PredictionResponse};

/// Stateless apart from the shared, read-only estimator. Safe to call from
/// any number of tasks at once.
pub struct PredictionService<C = SystemClock> {
    estimator: DemandEstimator,
    extractor: FeatureExtractor<C>,
    pricing: PricingPolicy,
}

impl PredictionService<SystemClock> {
    pub fn new(estimator: DemandEstimator) -> Self {
        Self::with_extractor(estimator, FeatureExtractor::new())
    }
}

impl<C: Clock> PredictionService<C> {
    pub fn with_extractor(estimator: DemandEstimator, extractor: FeatureExtractor<C>) -> Self {
        Self {
            estimator,
            extractor,
            pricing: PricingPolicy::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.estimator.is_available()
    }

    /// Handle a raw request body. Availability is checked before the body is
    /// even parsed.
    pub fn handle(&self, body: &[u8]) -> Result<PredictionResponse> {
        if !self.estimator.is_available() {
            return Err(ApiError::ServiceUnavailable);
        }

        let body: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        let request = PredictionRequest::from_json(&body)?;
        self.predict(request)
    }

    pub fn predict(&self, request: PredictionRequest) -> Result<PredictionResponse> {
        if !self.estimator.is_available() {
            return Err(ApiError::ServiceUnavailable);
        }

        let extracted = self
            .extractor
            .extract(request.location_id, request.timestamp.as_deref())?;
        let demand = self.estimator.estimate(&extracted.features)?;
        let price = self.pricing.price_for(demand);

        debug!(
            features = ?extracted.features,
            demand,
            tier = ?price.tier,
            "priced request"
        );

        Ok(PredictionResponse {
            location_id: extracted.features.location_id,
            timestamp: extracted.timestamp,
            predicted_demand: round2(demand),
            price_multiplier: price.multiplier,
            recommended_price_usd: round2(price.final_price),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::{FeatureFrame, Regressor};
    use crate::schema::LocationId;
    use chrono::NaiveDateTime;
    use std::sync::Arc;

    struct Stub(f64);

    impl Regressor for Stub {
        fn predict(&self, _frame: &FeatureFrame) -> std::result::Result<Vec<f64>, ModelError> {
            Ok(vec![self.0])
        }
    }

    struct Failing;

    impl Regressor for Failing {
        fn predict(&self, _frame: &FeatureFrame) -> std::result::Result<Vec<f64>, ModelError> {
            Err(ModelError::NonNumeric("JFK".to_string()))
        }
    }

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn service(demand: f64) -> PredictionService {
        PredictionService::new(DemandEstimator::new(Arc::new(Stub(demand))))
    }

    const SCENARIO: &[u8] = br#"{"location_id": 42, "timestamp": "2024-03-15T08:30:00"}"#;

    #[test]
    fn test_standard_demand_scenario() {
        let response = service(120.0).handle(SCENARIO).unwrap();
        assert_eq!(
            response,
            PredictionResponse {
                location_id: LocationId::from(42),
                timestamp: "2024-03-15T08:30:00".to_string(),
                predicted_demand: 120.0,
                price_multiplier: 1.0,
                recommended_price_usd: 10.0,
            }
        );
    }

    #[test]
    fn test_high_demand_scenario() {
        let response = service(400.0).handle(SCENARIO).unwrap();
        assert_eq!(response.price_multiplier, 1.5);
        assert_eq!(response.recommended_price_usd, 15.0);
    }

    #[test]
    fn test_demand_is_rounded_but_tier_uses_raw_value() {
        // 149.996 rounds to 150.0 yet stays in the standard tier
        let response = service(149.996).handle(SCENARIO).unwrap();
        assert_eq!(response.predicted_demand, 150.0);
        assert_eq!(response.price_multiplier, 1.0);

        let response = service(-12.346).handle(SCENARIO).unwrap();
        assert_eq!(response.predicted_demand, -12.35);
        assert_eq!(response.price_multiplier, 0.9);
        assert_eq!(response.recommended_price_usd, 9.0);
    }

    #[test]
    fn test_huge_demand_is_still_a_number() {
        let response = service(1e307).handle(SCENARIO).unwrap();
        assert!(response.predicted_demand.is_finite());
        assert_eq!(response.predicted_demand, 1e307);
        assert_eq!(response.price_multiplier, 1.5);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["predicted_demand"].is_number());
    }

    #[test]
    fn test_exact_tie_rounds_to_even() {
        let response = service(120.125).handle(SCENARIO).unwrap();
        assert_eq!(response.predicted_demand, 120.12);
    }

    #[test]
    fn test_unavailable_ignores_body() {
        let service = PredictionService::new(DemandEstimator::unavailable());
        let bodies: [&[u8]; 3] = [b"{}", b"garbage", SCENARIO];
        for body in bodies {
            let err = service.handle(body).unwrap_err();
            assert!(matches!(err, ApiError::ServiceUnavailable));
            assert_eq!(err.to_string(), "Model is not available");
        }
    }

    #[test]
    fn test_validation_failures() {
        let service = service(100.0);

        let err = service.handle(br#"{"timestamp": "2024-03-15T08:30:00"}"#).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::MissingLocationId)
        ));

        let err = service
            .handle(br#"{"location_id": 1, "timestamp": "not-a-date"}"#)
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Invalid isoformat string: 'not-a-date'");

        let err = service.handle(b"{\"location_id\": ").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_model_failure_is_server_error() {
        let service = PredictionService::new(DemandEstimator::new(Arc::new(Failing)));
        let err = service.handle(br#"{"location_id": "JFK"}"#).unwrap_err();
        assert!(!err.is_client_error());
        assert!(matches!(err, ApiError::Prediction(_)));
    }

    #[test]
    fn test_default_timestamp_is_echoed() {
        let now = NaiveDateTime::parse_from_str("2024-07-01 17:45:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let service = PredictionService::with_extractor(
            DemandEstimator::new(Arc::new(Stub(75.0))),
            FeatureExtractor::with_clock(FixedClock(now)),
        );

        let response = service.handle(br#"{"location_id": "7"}"#).unwrap();
        assert_eq!(response.timestamp, "2024-07-01T17:45:00");
        assert_eq!(response.location_id, LocationId::from("7"));
    }
}
