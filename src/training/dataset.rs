//! Training dataset artifacts.

use serde::{Deserialize, Serialize};

use crate::errors::TrainingError;

/// One labelled text sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub text: String,
    #[serde(default)]
    pub label: f64,
}

/// A dataset as produced by the extraction job: a JSON array of samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Deserializes an artifact, rejecting empty datasets.
    pub fn from_artifact(artifact: &[u8]) -> Result<Self, TrainingError> {
        let dataset: Dataset = serde_json::from_slice(artifact)?;
        if dataset.samples.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        Ok(dataset)
    }

    pub fn to_artifact(&self) -> Result<Vec<u8>, TrainingError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_artifact() {
        let artifact = br#"[{"text": "cat dog", "label": 1.0}, {"text": "fox"}]"#;
        let dataset = Dataset::from_artifact(artifact).expect("Dataset should parse");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.samples()[1].label, 0.0);
    }

    #[test]
    fn test_empty_artifact_rejected() {
        assert!(matches!(
            Dataset::from_artifact(b"[]"),
            Err(TrainingError::EmptyDataset)
        ));
    }

    #[test]
    fn test_malformed_artifact_rejected() {
        assert!(matches!(
            Dataset::from_artifact(b"not json"),
            Err(TrainingError::InvalidDataset(_))
        ));
    }
}
