use axum::body::Bytes;
use axum::http::StatusCode;
use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::any::Any;
use tracing::{error, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::schema::{ErrorResponse, PredictionResponse};

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable | ApiError::Prediction(_) | ApiError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            warn!(%status, error = %self, "rejected prediction request");
        } else {
            error!(%status, error = %self, "prediction request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// The body is read as raw bytes so a missing or wrong content type does not
/// reject the request before validation.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    state.service.handle(&body).map(Json)
}

pub async fn liveness() -> Json<Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let loaded = state.service.is_available();
    let (status, label) = if loaded {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "model_loaded": loaded,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Turns a handler panic into the same `{error}` payload as any other failure.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Unknown(detail).into_response()
}
