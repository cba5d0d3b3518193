use ::serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ValidationError;

/// Opaque location identifier. Echoed back exactly as received.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LocationId {
    Number(Number),
    Text(String),
    Bool(bool),
}

impl From<i64> for LocationId {
    fn from(id: i64) -> Self {
        LocationId::Number(id.into())
    }
}

impl From<i32> for LocationId {
    fn from(id: i32) -> Self {
        LocationId::Number(id.into())
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        LocationId::Text(id.to_string())
    }
}

/// A request that has passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub location_id: LocationId,
    pub timestamp: Option<String>,
}

impl PredictionRequest {
    /// Validate a raw JSON body. Anything that is not an object, or an object
    /// without a non-null `location_id`, is reported as a missing field.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let fields = body.as_object().ok_or(ValidationError::MissingLocationId)?;

        let location_id = match field(fields, "location_id") {
            None => return Err(ValidationError::MissingLocationId),
            Some(Value::Number(n)) => LocationId::Number(n.clone()),
            Some(Value::String(s)) => LocationId::Text(s.clone()),
            Some(Value::Bool(b)) => LocationId::Bool(*b),
            Some(_) => return Err(ValidationError::InvalidLocationId),
        };

        let timestamp = match field(fields, "timestamp") {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(ValidationError::InvalidTimestampType),
        };

        Ok(Self {
            location_id,
            timestamp,
        })
    }
}

// null counts as absent
fn field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|v| !v.is_null())
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionResponse {
    pub location_id: LocationId,
    pub timestamp: String,
    pub predicted_demand: f64,
    pub price_multiplier: f64,
    pub recommended_price_usd: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
