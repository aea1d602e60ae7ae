//! Pre-trained crop classifier loaded from an exported model artifact.
//!
//! Training happens offline; this service only consumes the result. The
//! artifact is a JSON export of the fitted decision tree plus the label
//! encoder classes:
//!
//! ```json
//! {
//!   "labels": ["cotton", "maize", "rice"],
//!   "tree": [
//!     { "feature": 4, "threshold": 180.0, "left": 1, "right": 2 },
//!     { "label": 1 },
//!     { "label": 2 }
//!   ]
//! }
//! ```
//!
//! Split nodes route `features[feature] <= threshold` to `left`, otherwise
//! `right`, matching the exporter's convention. Leaves hold a label id that
//! decodes through the codebook. Feature indices refer to the fixed
//! [`FeatureVector`] order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::FeatureVector;

// ---

/// Failures surfaced by the classifier boundary.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The model artifact is internally inconsistent.
    #[error("malformed model: {0}")]
    MalformedModel(String),

    /// The tree produced a label id the codebook does not know.
    #[error("unknown label id {0}")]
    UnknownLabel(usize),
}

/// Boundary to the pre-trained model: one feature vector in, one label id out.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<usize, ClassifierError>;
}

/// Encoder classes in id order; decodes label ids back to crop names.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct LabelCodebook(Vec<String>);

impl LabelCodebook {
    // ---
    #[cfg(test)]
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn decode(&self, id: usize) -> Result<&str, ClassifierError> {
        // ---
        self.0
            .get(id)
            .map(String::as_str)
            .ok_or(ClassifierError::UnknownLabel(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: usize,
    },
}

/// The shipped classifier implementation: a decision tree walked over the
/// fixed-order feature vector, with a codebook for decoding.
#[derive(Debug, Deserialize)]
pub struct CropModel {
    // ---
    labels: LabelCodebook,
    tree: Vec<TreeNode>,
}

impl CropModel {
    // ---
    /// Load and validate a model artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        // ---
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read model file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed to load model file {}", path.display()))
    }

    /// Parse and validate an artifact from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        // ---
        let model: CropModel = serde_json::from_str(raw).context("invalid model JSON")?;
        model.check()?;
        Ok(model)
    }

    pub fn codebook(&self) -> &LabelCodebook {
        &self.labels
    }

    /// Validate the artifact once at load time so `predict` cannot walk out
    /// of the tree or produce an undecodable label at inference time.
    fn check(&self) -> Result<(), ClassifierError> {
        // ---
        if self.labels.is_empty() {
            return Err(ClassifierError::MalformedModel("empty label codebook".into()));
        }
        if self.tree.is_empty() {
            return Err(ClassifierError::MalformedModel("empty tree".into()));
        }
        for (i, node) in self.tree.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= 6 {
                        return Err(ClassifierError::MalformedModel(format!(
                            "node {i} splits on feature {feature}, expected 0..6"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ClassifierError::MalformedModel(format!(
                            "node {i} has non-finite threshold"
                        )));
                    }
                    // Children must point strictly forward; the exporter
                    // writes nodes in preorder, which guarantees termination.
                    if *left <= i || *right <= i || *left >= self.tree.len() || *right >= self.tree.len() {
                        return Err(ClassifierError::MalformedModel(format!(
                            "node {i} has out-of-range children {left}/{right}"
                        )));
                    }
                }
                TreeNode::Leaf { label } => {
                    if *label >= self.labels.len() {
                        return Err(ClassifierError::UnknownLabel(*label));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Classifier for CropModel {
    // ---
    fn predict(&self, features: &FeatureVector) -> Result<usize, ClassifierError> {
        // ---
        let mut node = 0usize;
        loop {
            match &self.tree[node] {
                TreeNode::Leaf { label } => return Ok(*label),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Bounds were checked at load time; children always
                    // point forward, so this walk terminates.
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}
