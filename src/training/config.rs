//! Hyperparameter configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TrainingError;

/// A single named hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl HyperValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for HyperValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for HyperValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for HyperValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for HyperValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for HyperValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Named hyperparameters handed to a trainable model.
///
/// Serializes as a flat JSON object, e.g. `{"epochs": 10, "learning_rate": 0.01}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hyperparameters {
    values: BTreeMap<String, HyperValue>,
}

impl Hyperparameters {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<HyperValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&HyperValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HyperValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads an integer, falling back to `default` when absent.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, TrainingError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(value) => value.as_int().ok_or_else(|| invalid(name, "expected an integer")),
        }
    }

    /// Reads a number, falling back to `default` when absent.
    pub fn float_or(&self, name: &str, default: f64) -> Result<f64, TrainingError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(value) => value.as_float().ok_or_else(|| invalid(name, "expected a number")),
        }
    }

    /// Loads hyperparameters from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, TrainingError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

fn invalid(name: &str, message: &str) -> TrainingError {
    TrainingError::InvalidHyperparameter {
        name: name.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let params = Hyperparameters::new()
            .set("epochs", 10i64)
            .set("learning_rate", 0.01)
            .set("optimizer", "adam");

        assert_eq!(params.len(), 3);
        assert_eq!(params.int_or("epochs", 1).unwrap(), 10);
        assert!((params.float_or("learning_rate", 0.0).unwrap() - 0.01).abs() < 1e-10);
        assert_eq!(params.get("optimizer").and_then(HyperValue::as_str), Some("adam"));
    }

    #[test]
    fn test_defaults_when_absent() {
        let params = Hyperparameters::new();
        assert_eq!(params.int_or("epochs", 100).unwrap(), 100);
        assert!((params.float_or("learning_rate", 0.001).unwrap() - 0.001).abs() < 1e-10);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let params = Hyperparameters::new().set("epochs", "many");
        assert!(matches!(
            params.int_or("epochs", 1),
            Err(TrainingError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_json_keeps_integers_integral() {
        let params =
            Hyperparameters::from_json(r#"{"epochs": 5, "dropout": 0.5, "verbose": true}"#).unwrap();
        assert_eq!(params.get("epochs"), Some(&HyperValue::Int(5)));
        assert_eq!(params.get("dropout"), Some(&HyperValue::Float(0.5)));
        assert_eq!(params.get("verbose"), Some(&HyperValue::Bool(true)));
    }

    #[test]
    fn test_display_is_sorted() {
        let params = Hyperparameters::new().set("b", 2i64).set("a", "x");
        assert_eq!(params.to_string(), r#"{a: "x", b: 2}"#);
    }
}
