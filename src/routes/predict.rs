use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use super::AppState;
use crate::AggregationError;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/predict_crop_type", get(handler))
}

/// Consensus crop prediction over the recent observation window.
///
/// An empty store is the caller's 404; everything else that goes wrong in
/// the store or the classifier surfaces as a 500 with the error text.
async fn handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    // ---
    match state.engine.predict_dominant_crop().await {
        Ok(label) => {
            info!("Dominant crop over recent window: {}", label);
            (StatusCode::OK, Json(json!({ "predicted_crop_type": label })))
        }
        Err(AggregationError::NoData) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "message": "No sensor data found" })),
        ),
        Err(e) => {
            error!("Aggregation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}
