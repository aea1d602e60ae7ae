use axum::{
    extract::rejection::JsonRejection, extract::State, http::StatusCode, routing::post, Json,
    Router,
};
use serde_json::{json, Value};
use tracing::{error, info};

use super::AppState;
use crate::{IngestError, RawSensorPayload};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/nodemcu/data", post(handler))
}

/// Push-path ingestion endpoint for the NodeMCU device.
///
/// Responses mirror what the device firmware expects: a `status` envelope
/// with 200 on success, 400 when required fields are missing, 500 otherwise.
async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<RawSensorPayload>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    // ---
    let Json(raw) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            error!("Rejected sensor payload: {}", rejection.body_text());
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": rejection.body_text() })),
            );
        }
    };

    info!("Data received from NodeMCU: {:?}", raw);

    match state.ingestor.receive(&raw).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success" }))),
        Err(IngestError::IncompleteData) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "Incomplete data" })),
        ),
        Err(e) => {
            error!("Failed to store pushed snapshot: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}
