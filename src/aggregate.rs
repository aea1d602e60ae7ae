//! Majority-vote aggregation over a window of recent observations.
//!
//! Each row in the window is classified independently and the plurality
//! label wins. Voting across a fixed-size window smooths single-reading
//! noise and occasional sensor glitches without any stateful filtering;
//! the engine holds no state beyond the transient tally of one call.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    Classifier, ClassifierError, CropModel, LabelCodebook, Observation, ObservationStore,
    StoreError,
};

// ---

/// Failures surfaced by a prediction query.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The store holds no observations to classify.
    #[error("no sensor data found")]
    NoData,

    /// A per-row prediction failed; the whole window is discarded rather
    /// than letting a partial tally elect a misleading majority.
    #[error("inference failed: {0}")]
    InferenceFailure(#[from] ClassifierError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reads a recent window from the store and reduces it to one crop label.
pub struct AggregationEngine {
    // ---
    store: ObservationStore,
    model: Arc<CropModel>,
    window: i64,
}

impl AggregationEngine {
    // ---
    pub fn new(store: ObservationStore, model: Arc<CropModel>, window: i64) -> Self {
        Self {
            store,
            model,
            window,
        }
    }

    /// Classify the most recent window and return the plurality crop label.
    ///
    /// Re-reads the store on every call; there is no caching, so the answer
    /// always reflects current data.
    pub async fn predict_dominant_crop(&self) -> Result<String, AggregationError> {
        // ---
        let rows = self.store.read_recent(self.window).await?;
        debug!("Aggregating over {} observations", rows.len());

        classify_window(&rows, self.model.as_ref(), self.model.codebook())
    }
}

// ---

/// Classify every row and fold the labels into a plurality winner.
///
/// The tally keeps labels in first-seen order and the final scan only
/// replaces the leader on a strictly greater count, so when several labels
/// share the maximum the one that entered the tally first wins. That makes
/// repeated runs over the same rows agree, which off-the-shelf "most
/// common" helpers do not all guarantee.
fn classify_window(
    rows: &[Observation],
    classifier: &dyn Classifier,
    codebook: &LabelCodebook,
) -> Result<String, AggregationError> {
    // ---
    if rows.is_empty() {
        return Err(AggregationError::NoData);
    }

    let mut tally: Vec<(String, u32)> = Vec::new();
    for row in rows {
        let label_id = classifier.predict(&row.features())?;
        let label = codebook.decode(label_id)?;

        match tally.iter_mut().find(|entry| entry.0 == label) {
            Some(entry) => entry.1 += 1,
            None => tally.push((label.to_string(), 1)),
        }
    }

    let mut winner = &tally[0];
    for entry in &tally[1..] {
        if entry.1 > winner.1 {
            winner = entry;
        }
    }

    Ok(winner.0.clone())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::FeatureVector;
    use chrono::{TimeZone, Utc};

    /// Test double that reads the label id straight out of the temperature
    /// field, so a row "is" its label.
    struct TemperatureStub;

    impl Classifier for TemperatureStub {
        fn predict(&self, features: &FeatureVector) -> Result<usize, ClassifierError> {
            Ok(features[2] as usize)
        }
    }

    /// Test double that refuses every row.
    struct FailingStub;

    impl Classifier for FailingStub {
        fn predict(&self, _features: &FeatureVector) -> Result<usize, ClassifierError> {
            Err(ClassifierError::MalformedModel("stub failure".into()))
        }
    }

    fn codebook() -> LabelCodebook {
        LabelCodebook::new(vec![
            "cotton".to_string(),
            "maize".to_string(),
            "rice".to_string(),
        ])
    }

    /// One observation per entry; `label_ids` drive the stub classifier.
    fn rows_for(label_ids: &[usize]) -> Vec<Observation> {
        // ---
        label_ids
            .iter()
            .enumerate()
            .map(|(i, id)| Observation {
                id: i as i32 + 1,
                year: 2025,
                day_of_year: 85,
                temperature: *id as f64,
                humidity: 60.0,
                rainfall: 120.0,
                soil_moisture: 40.0,
                captured_at: Utc.with_ymd_and_hms(2025, 3, 26, 12, 0, i as u32).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_empty_window_is_no_data() {
        // ---
        let result = classify_window(&[], &TemperatureStub, &codebook());
        assert!(matches!(result, Err(AggregationError::NoData)));
    }

    #[test]
    fn test_plurality_label_wins() {
        // ---
        // cotton:3, maize:5, rice:2
        let rows = rows_for(&[0, 1, 1, 0, 2, 1, 1, 0, 2, 1]);
        let winner = classify_window(&rows, &TemperatureStub, &codebook()).unwrap();

        assert_eq!(winner, "maize");
    }

    #[test]
    fn test_unanimous_window() {
        // ---
        let rows = rows_for(&[2, 2, 2, 2]);
        let winner = classify_window(&rows, &TemperatureStub, &codebook()).unwrap();

        assert_eq!(winner, "rice");
    }

    #[test]
    fn test_tie_goes_to_first_seen_label() {
        // ---
        // cotton and maize both reach 4; cotton entered the tally first
        let rows = rows_for(&[0, 1, 0, 1, 1, 0, 0, 1]);
        let winner = classify_window(&rows, &TemperatureStub, &codebook()).unwrap();

        assert_eq!(winner, "cotton");

        // Swapping which label appears first flips the tie the same way
        let rows = rows_for(&[1, 0, 1, 0, 0, 1, 1, 0]);
        let winner = classify_window(&rows, &TemperatureStub, &codebook()).unwrap();

        assert_eq!(winner, "maize");
    }

    #[test]
    fn test_repeated_runs_agree() {
        // ---
        let rows = rows_for(&[2, 0, 2, 1, 0, 2, 1, 0]);

        let first = classify_window(&rows, &TemperatureStub, &codebook()).unwrap();
        let second = classify_window(&rows, &TemperatureStub, &codebook()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_any_row_failure_discards_the_window() {
        // ---
        let rows = rows_for(&[0, 1, 1]);
        let result = classify_window(&rows, &FailingStub, &codebook());

        assert!(matches!(result, Err(AggregationError::InferenceFailure(_))));
    }

    #[test]
    fn test_undecodable_label_discards_the_window() {
        // ---
        // Label id 9 is outside the three-entry codebook
        let rows = rows_for(&[0, 9, 1]);
        let result = classify_window(&rows, &TemperatureStub, &codebook());

        assert!(matches!(
            result,
            Err(AggregationError::InferenceFailure(
                ClassifierError::UnknownLabel(9)
            ))
        ));
    }
}
