//! Durable observation store backed by PostgreSQL.
//!
//! The store is append-only: writers insert one row per sensor snapshot and
//! nothing ever updates or deletes. The single reader is the aggregation
//! engine, which asks for the most recent N rows. All access goes through
//! the shared connection pool, so concurrent writers (pull tick, push
//! handler) and the reader serialize at the pool, not in process.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use crate::{NewObservation, Observation};

// ---

/// Failures surfaced by the observation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row invariant was violated before the insert was attempted.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only log of sensor observations with a most-recent-first read API.
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Clone)]
pub struct ObservationStore {
    // ---
    pool: PgPool,
}

impl ObservationStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one observation and return its id.
    ///
    /// `captured_at` is assigned from the service clock here, at write time,
    /// so it reflects insert order rather than anything the device claims.
    /// The insert is a single statement: it either lands completely or not
    /// at all.
    pub async fn append(&self, new: &NewObservation) -> Result<i32, StoreError> {
        // ---
        new.validate().map_err(StoreError::ConstraintViolation)?;

        let row: (i32,) = sqlx::query_as(
            r#"
            INSERT INTO sensor_data (
                year, day_of_year, temperature, humidity,
                rainfall, soil_moisture, captured_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(new.year)
        .bind(new.day_of_year)
        .bind(new.temperature)
        .bind(new.humidity)
        .bind(new.rainfall)
        .bind(new.soil_moisture)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Up to `limit` observations, newest first.
    ///
    /// Returns fewer rows (including none) without error when the store
    /// holds fewer. `id` breaks same-timestamp ties so the order is total.
    pub async fn read_recent(&self, limit: i64) -> Result<Vec<Observation>, StoreError> {
        // ---
        let rows = sqlx::query_as::<_, Observation>(
            r#"
            SELECT id, year, day_of_year, temperature, humidity,
                   rainfall, soil_moisture, captured_at
            FROM sensor_data
            ORDER BY captured_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
