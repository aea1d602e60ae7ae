//! Dual-path sensor ingestion: scheduled pull and push receive.
//!
//! Both entry points funnel into the same normalize-and-append tail so the
//! two integrations cannot drift apart on validation or field mapping. A
//! failed attempt is terminal for that attempt only; the caller (scheduler
//! tick or request handler) decides when the next one happens.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::{NewObservation, ObservationStore, RawSensorPayload, SensorPayload, StoreError};

// ---

/// Failures surfaced by either ingestion path.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport failure or non-2xx answer from the sensor endpoint.
    #[error("sensor endpoint unreachable: {0}")]
    TransportFailure(String),

    /// Pull response body did not parse into a usable snapshot.
    #[error("malformed sensor payload: {0}")]
    MalformedPayload(String),

    /// Push payload was missing required fields.
    #[error("incomplete data")]
    IncompleteData,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Normalizes sensor snapshots from either path and writes them to the store.
pub struct Ingestor {
    // ---
    store: ObservationStore,
    client: reqwest::Client,
    sensor_url: String,
}

impl Ingestor {
    // ---
    pub fn new(store: ObservationStore, sensor_url: String, timeout: Duration) -> Result<Self> {
        // ---
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            store,
            client,
            sensor_url,
        })
    }

    /// One pull tick: fetch a snapshot from the sensor endpoint and store it.
    ///
    /// No retry happens here; a failed tick waits for the next scheduled one.
    pub async fn pull_once(&self) -> Result<(), IngestError> {
        // ---
        debug!("Pulling sensor snapshot from {}", self.sensor_url);

        let response = self
            .client
            .get(&self.sensor_url)
            .send()
            .await
            .map_err(|e| IngestError::TransportFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IngestError::TransportFailure(format!(
                "sensor endpoint returned {}",
                response.status()
            )));
        }

        let raw: RawSensorPayload = response
            .json()
            .await
            .map_err(|e| IngestError::MalformedPayload(e.to_string()))?;

        let payload = raw.complete().map_err(|missing| {
            IngestError::MalformedPayload(format!("missing fields: {}", missing.join(", ")))
        })?;

        self.normalize_and_store(&payload).await
    }

    /// Push path: validate an externally submitted snapshot and store it.
    ///
    /// Nothing is written when fields are missing; the handler maps
    /// [`IngestError::IncompleteData`] to a client error.
    pub async fn receive(&self, raw: &RawSensorPayload) -> Result<(), IngestError> {
        // ---
        let payload = raw.complete().map_err(|_| IngestError::IncompleteData)?;
        self.normalize_and_store(&payload).await
    }

    /// Shared tail of both paths: derive the calendar fields from the
    /// ingestion clock and append exactly one observation.
    async fn normalize_and_store(&self, payload: &SensorPayload) -> Result<(), IngestError> {
        // ---
        let new = NewObservation::from_payload(payload, Utc::now());
        let id = self.store.append(&new).await?;

        info!(
            "Stored observation {} (year {}, day {})",
            id, new.year, new.day_of_year
        );
        Ok(())
    }
}
