use std::sync::Arc;

use axum::Router;

use crate::{AggregationEngine, Ingestor};

mod health;
mod ingest;
mod predict;

// ---

/// Handles shared by all routes, constructed once in `main` and injected.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub ingestor: Arc<Ingestor>,
    pub engine: Arc<AggregationEngine>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(predict::router())
        .merge(health::router())
        .with_state(state)
}
