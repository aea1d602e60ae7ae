//! Data models for the crop prediction pipeline.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Raw sensor snapshot as the NodeMCU device sends it.
///
/// Every field is optional at the serde layer so that presence checking is a
/// domain decision (push path answers 400, pull path abandons the tick)
/// rather than a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RawSensorPayload {
    // ---
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil: Option<f64>,
    pub rain: Option<f64>,
}

/// A sensor snapshot with all four measurements present.
#[derive(Debug, Clone, Copy)]
pub struct SensorPayload {
    // ---
    pub temperature: f64,
    pub humidity: f64,
    pub soil: f64,
    pub rain: f64,
}

impl RawSensorPayload {
    // ---
    /// Names of the required fields absent from this payload, in wire order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        // ---
        let mut missing = Vec::new();
        if self.temperature.is_none() {
            missing.push("temperature");
        }
        if self.humidity.is_none() {
            missing.push("humidity");
        }
        if self.soil.is_none() {
            missing.push("soil");
        }
        if self.rain.is_none() {
            missing.push("rain");
        }
        missing
    }

    /// Upgrade to a complete payload, or report which fields are missing.
    pub fn complete(&self) -> Result<SensorPayload, Vec<&'static str>> {
        // ---
        match (self.temperature, self.humidity, self.soil, self.rain) {
            (Some(temperature), Some(humidity), Some(soil), Some(rain)) => Ok(SensorPayload {
                temperature,
                humidity,
                soil,
                rain,
            }),
            _ => Err(self.missing_fields()),
        }
    }
}

// ---

/// An observation ready for insertion.
///
/// `captured_at` is assigned by the store at write time, so it does not
/// appear here.
#[derive(Debug, Clone, Copy)]
pub struct NewObservation {
    // ---
    pub year: i32,
    pub day_of_year: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub soil_moisture: f64,
}

impl NewObservation {
    // ---
    /// Normalize a device payload into the stored shape.
    ///
    /// The device supplies no calendar context, so `year` and `day_of_year`
    /// come from the ingestion clock, and the wire names `soil`/`rain` map
    /// to their column names `soil_moisture`/`rainfall`.
    pub fn from_payload(payload: &SensorPayload, now: DateTime<Utc>) -> Self {
        // ---
        Self {
            year: now.year(),
            day_of_year: now.ordinal() as i32,
            temperature: payload.temperature,
            humidity: payload.humidity,
            rainfall: payload.rain,
            soil_moisture: payload.soil,
        }
    }

    /// Check the row invariants: day-of-year in range, all measurements finite.
    pub fn validate(&self) -> Result<(), String> {
        // ---
        if !(1..=366).contains(&self.day_of_year) {
            return Err(format!(
                "day_of_year {} out of range 1..=366",
                self.day_of_year
            ));
        }
        for (name, value) in [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("rainfall", self.rainfall),
            ("soil_moisture", self.soil_moisture),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} is not finite: {value}"));
            }
        }
        Ok(())
    }
}

// ---

/// One persisted sensor snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Observation {
    // ---
    pub id: i32,
    pub year: i32,
    pub day_of_year: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub soil_moisture: f64,
    pub captured_at: DateTime<Utc>,
}

/// Classifier input. The field order is the order the model was trained on
/// and must not change.
pub type FeatureVector = [f64; 6];

impl Observation {
    // ---
    pub fn features(&self) -> FeatureVector {
        // ---
        [
            self.year as f64,
            self.day_of_year as f64,
            self.temperature,
            self.humidity,
            self.rainfall,
            self.soil_moisture,
        ]
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn full_payload() -> RawSensorPayload {
        // ---
        RawSensorPayload {
            temperature: Some(24.5),
            humidity: Some(61.0),
            soil: Some(42.0),
            rain: Some(130.0),
        }
    }

    #[test]
    fn test_complete_payload_passes() {
        // ---
        let payload = full_payload().complete().expect("payload is complete");

        assert_eq!(payload.temperature, 24.5);
        assert_eq!(payload.humidity, 61.0);
        assert_eq!(payload.soil, 42.0);
        assert_eq!(payload.rain, 130.0);
    }

    #[test]
    fn test_missing_fields_are_reported_in_wire_order() {
        // ---
        let mut payload = full_payload();
        payload.humidity = None;
        payload.rain = None;

        assert_eq!(payload.missing_fields(), vec!["humidity", "rain"]);
        assert!(payload.complete().is_err());

        let empty = RawSensorPayload::default();
        assert_eq!(
            empty.missing_fields(),
            vec!["temperature", "humidity", "soil", "rain"]
        );
    }

    #[test]
    fn test_normalization_maps_wire_names_and_derives_calendar() {
        // ---
        let payload = full_payload().complete().unwrap();

        // 2025-03-26 is day 85 of a non-leap year
        let now = Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap();
        let obs = NewObservation::from_payload(&payload, now);

        assert_eq!(obs.year, 2025);
        assert_eq!(obs.day_of_year, 85);
        assert_eq!(obs.rainfall, 130.0);
        assert_eq!(obs.soil_moisture, 42.0);
        assert_eq!(obs.temperature, 24.5);
        assert_eq!(obs.humidity, 61.0);
    }

    #[test]
    fn test_calendar_derivation_on_year_boundaries() {
        // ---
        let payload = full_payload().complete().unwrap();

        let jan_first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            NewObservation::from_payload(&payload, jan_first).day_of_year,
            1
        );

        // Leap year keeps day 366 in range
        let leap_last = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let obs = NewObservation::from_payload(&payload, leap_last);
        assert_eq!(obs.day_of_year, 366);
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_measurements() {
        // ---
        let payload = full_payload().complete().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        let mut obs = NewObservation::from_payload(&payload, now);
        assert!(obs.validate().is_ok());

        obs.humidity = f64::NAN;
        assert!(obs.validate().is_err());

        obs.humidity = 61.0;
        obs.rainfall = f64::INFINITY;
        assert!(obs.validate().is_err());
    }

    #[test]
    fn test_feature_vector_field_order() {
        // ---
        let obs = Observation {
            id: 1,
            year: 2025,
            day_of_year: 85,
            temperature: 24.5,
            humidity: 61.0,
            rainfall: 130.0,
            soil_moisture: 42.0,
            captured_at: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
        };

        assert_eq!(obs.features(), [2025.0, 85.0, 24.5, 61.0, 130.0, 42.0]);
    }
}
