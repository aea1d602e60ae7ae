//! Database schema management for `cropflow`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `sensor_data` table, the append-only observation log behind
/// both ingestion paths and the aggregation window query. Safe to call on
/// every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Rows are immutable once written; no updates or deletes anywhere.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_data (
            id            SERIAL PRIMARY KEY,
            year          INTEGER          NOT NULL,
            day_of_year   INTEGER          NOT NULL,
            temperature   DOUBLE PRECISION NOT NULL,
            humidity      DOUBLE PRECISION NOT NULL,
            rainfall      DOUBLE PRECISION NOT NULL,
            soil_moisture DOUBLE PRECISION NOT NULL,
            captured_at   TIMESTAMPTZ      NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Index matching the newest-first window query in `ObservationStore::read_recent`
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_data_captured_at
            ON sensor_data (captured_at DESC, id DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
