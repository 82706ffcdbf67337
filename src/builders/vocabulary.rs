//! Token-to-id vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Ids reserved for out-of-vocabulary tokens. No vocabulary entry may use
/// them, or any id below 2.
pub const OOV_SENTINELS: [i64; 3] = [-1, 0, 1];

/// A validated, ordered `token -> id` table.
///
/// The parallel token and id lists handed to `CategoryMapper` are derived in
/// the single construction path, so they can never disagree with the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct Vocabulary {
    table: BTreeMap<String, i64>,
    tokens: Vec<String>,
    ids: Vec<i64>,
}

impl Vocabulary {
    /// Builds a vocabulary from `(token, id)` pairs. Later duplicates of a
    /// token replace earlier ones.
    pub fn new<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let table: BTreeMap<String, i64> = entries
            .into_iter()
            .map(|(token, id)| (token.into(), id))
            .collect();
        Self::from_table(table)
    }

    fn from_table(table: BTreeMap<String, i64>) -> Result<Self, ConfigError> {
        if table.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }
        if let Some((token, id)) = table.iter().find(|(_, id)| **id <= 1) {
            return Err(ConfigError::ReservedVocabularyId {
                token: token.clone(),
                id: *id,
            });
        }

        let tokens = table.keys().cloned().collect();
        let ids = table.values().copied().collect();
        Ok(Self { table, tokens, ids })
    }

    /// Token list, in table order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Id list, parallel to [`tokens`](Self::tokens).
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn get(&self, token: &str) -> Option<i64> {
        self.table.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, i64> {
        &self.table
    }
}

impl TryFrom<BTreeMap<String, i64>> for Vocabulary {
    type Error = ConfigError;

    fn try_from(table: BTreeMap<String, i64>) -> Result<Self, Self::Error> {
        Self::from_table(table)
    }
}

impl From<Vocabulary> for BTreeMap<String, i64> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projections_are_parallel() {
        let vocab = Vocabulary::new([("dog", 3), ("cat", 2)]).unwrap();
        assert_eq!(vocab.tokens(), ["cat".to_string(), "dog".to_string()]);
        assert_eq!(vocab.ids(), [2, 3]);
        assert_eq!(vocab.get("dog"), Some(3));
        assert_eq!(vocab.get("fox"), None);
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let result = Vocabulary::new(Vec::<(String, i64)>::new());
        assert_eq!(result, Err(ConfigError::EmptyVocabulary));
    }

    #[test]
    fn test_reserved_ids_rejected() {
        for id in [-5, -1, 0, 1] {
            let result = Vocabulary::new([("cat", 2), ("dog", id)]);
            assert_eq!(
                result,
                Err(ConfigError::ReservedVocabularyId {
                    token: "dog".to_string(),
                    id,
                })
            );
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Vocabulary = serde_json::from_str(r#"{"cat": 2}"#).unwrap();
        assert_eq!(ok.len(), 1);

        let bad = serde_json::from_str::<Vocabulary>(r#"{"cat": 1}"#);
        assert!(bad.is_err());
    }
}
