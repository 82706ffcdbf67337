//! The train, validate, serialize flow.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Dataset, Hyperparameters};
use crate::builders::Vocabulary;
use crate::errors::TrainingError;

/// A model that can be fitted on a [`Dataset`] and serialized to bytes.
pub trait TrainableModel: Sized {
    /// Constructs an untrained model.
    fn from_hyperparameters(hyperparameters: &Hyperparameters) -> Result<Self, TrainingError>;

    fn train(&mut self, dataset: &Dataset) -> Result<(), TrainingError>;

    /// Sanity-checks the fitted state.
    fn validate_training(&self) -> Result<(), TrainingError>;

    fn serialize(&self) -> Result<Vec<u8>, TrainingError>;
}

/// What [`DummyModel`] learns: dataset statistics and a frequency-ranked
/// vocabulary ready for a [`Mapper`](crate::builders::Mapper).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyArtifact {
    pub samples: usize,
    pub mean_label: f64,
    pub vocabulary: Vocabulary,
}

/// Stand-in model that fits no weights.
///
/// Tokens are whitespace-split and lowercased, ranked by frequency (ties by
/// token), and numbered from 2 so the reserved out-of-vocabulary ids stay free.
/// Recognized hyperparameters: `max_vocabulary` (default 1000) and
/// `min_count` (default 1).
#[derive(Debug, Clone)]
pub struct DummyModel {
    max_vocabulary: usize,
    min_count: usize,
    fitted: Option<DummyArtifact>,
}

const DEFAULT_MAX_VOCABULARY: i64 = 1000;
const DEFAULT_MIN_COUNT: i64 = 1;
const FIRST_ID: i64 = 2;

impl DummyModel {
    pub fn artifact(&self) -> Option<&DummyArtifact> {
        self.fitted.as_ref()
    }
}

impl TrainableModel for DummyModel {
    fn from_hyperparameters(hyperparameters: &Hyperparameters) -> Result<Self, TrainingError> {
        let max_vocabulary = positive(hyperparameters, "max_vocabulary", DEFAULT_MAX_VOCABULARY)?;
        let min_count = positive(hyperparameters, "min_count", DEFAULT_MIN_COUNT)?;
        Ok(Self {
            max_vocabulary,
            min_count,
            fitted: None,
        })
    }

    fn train(&mut self, dataset: &Dataset) -> Result<(), TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for sample in dataset.samples() {
            for token in sample.text.split_whitespace() {
                *counts.entry(token.to_lowercase()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, count)| *count >= self.min_count)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_vocabulary);

        let vocabulary = Vocabulary::new(
            ranked
                .into_iter()
                .zip(FIRST_ID..)
                .map(|((token, _), id)| (token, id)),
        )?;

        let mean_label =
            dataset.samples().iter().map(|s| s.label).sum::<f64>() / dataset.len() as f64;

        self.fitted = Some(DummyArtifact {
            samples: dataset.len(),
            mean_label,
            vocabulary,
        });
        Ok(())
    }

    fn validate_training(&self) -> Result<(), TrainingError> {
        let fitted = self.fitted.as_ref().ok_or(TrainingError::NotTrained)?;
        if !fitted.mean_label.is_finite() {
            return Err(TrainingError::ValidationFailed {
                message: format!("mean label is {}", fitted.mean_label),
            });
        }
        if fitted.vocabulary.len() > self.max_vocabulary {
            return Err(TrainingError::ValidationFailed {
                message: format!(
                    "vocabulary has {} entries, limit is {}",
                    fitted.vocabulary.len(),
                    self.max_vocabulary
                ),
            });
        }
        Ok(())
    }

    fn serialize(&self) -> Result<Vec<u8>, TrainingError> {
        let fitted = self.fitted.as_ref().ok_or(TrainingError::NotTrained)?;
        Ok(serde_json::to_vec(fitted)?)
    }
}

fn positive(
    hyperparameters: &Hyperparameters,
    name: &str,
    default: i64,
) -> Result<usize, TrainingError> {
    let value = hyperparameters.int_or(name, default)?;
    if value <= 0 {
        return Err(TrainingError::InvalidHyperparameter {
            name: name.to_string(),
            message: format!("must be positive, got {value}"),
        });
    }
    Ok(value as usize)
}

/// Unpacks a dataset artifact, trains `M` on it and returns the serialized
/// model.
pub fn do_train<M: TrainableModel>(
    artifact: &[u8],
    hyperparameters: &Hyperparameters,
) -> Result<Vec<u8>, TrainingError> {
    let mut model = M::from_hyperparameters(hyperparameters)?;
    let dataset = Dataset::from_artifact(artifact)?;
    model.train(&dataset)?;
    model.validate_training()?;
    log::info!(
        "Trained {} on {} samples with params: {}",
        std::any::type_name::<M>().rsplit("::").next().unwrap_or_default(),
        dataset.len(),
        hyperparameters
    );
    model.serialize()
}
