//! Declarative pipeline configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::builders::{
    CaseChangeAction, Mapper, MapperConfig, Numericalizer, Tokenizer, TokenizerConfig, Vocabulary,
};
use crate::errors::{ConfigError, Error};
use crate::graph::Model;

/// A complete text-preprocessing pipeline, loadable from JSON.
///
/// ```json
/// {
///   "tokenizer": { "case_change_action": "LOWER", "separators": [" "], "stopwords": ["the"] },
///   "mapper": { "vocabulary": { "cat": 2, "dog": 3 }, "oov_token": 1, "output_vector_length": 5 }
/// }
/// ```
///
/// The `tokenizer` section and the mapper's `oov_token` and
/// `output_vector_length` may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub tokenizer: TokenizerConfig,
    pub mapper: MapperConfig,
}

/// JSON shape of [`PipelineConfig`] before any value is checked.
#[derive(Deserialize)]
struct RawPipelineConfig {
    #[serde(default)]
    tokenizer: RawTokenizerConfig,
    mapper: RawMapperConfig,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawTokenizerConfig {
    case_change_action: Option<String>,
    separators: Option<Vec<String>>,
    stopwords: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawMapperConfig {
    vocabulary: BTreeMap<String, i64>,
    oov_token: Option<i64>,
    output_vector_length: Option<i64>,
}

impl RawPipelineConfig {
    fn into_config(self) -> Result<PipelineConfig, ConfigError> {
        let mut tokenizer = TokenizerConfig::default();
        if let Some(action) = self.tokenizer.case_change_action {
            tokenizer.case_change_action = action.parse::<CaseChangeAction>()?;
        }
        if let Some(separators) = self.tokenizer.separators {
            tokenizer.separators = separators;
        }
        if let Some(stopwords) = self.tokenizer.stopwords {
            tokenizer.stopwords = stopwords;
        }

        let mut mapper = MapperConfig::new(Vocabulary::new(self.mapper.vocabulary)?);
        if let Some(oov_token) = self.mapper.oov_token {
            mapper.oov_token = oov_token;
        }
        if let Some(length) = self.mapper.output_vector_length {
            mapper.output_vector_length = length;
        }

        Ok(PipelineConfig { tokenizer, mapper })
    }
}

impl PipelineConfig {
    pub fn new(tokenizer: TokenizerConfig, mapper: MapperConfig) -> Self {
        Self { tokenizer, mapper }
    }

    /// Parses a pipeline. Malformed JSON is an [`Error::Serialization`]; a
    /// reserved vocabulary id or an unknown case action is an
    /// [`Error::Config`].
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let raw: RawPipelineConfig = serde_json::from_str(json)?;
        Ok(raw.into_config()?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates both sections and returns the configured builder.
    pub fn numericalizer(&self) -> Result<Numericalizer, ConfigError> {
        let tokenizer = Tokenizer::new(self.tokenizer.clone())?;
        let mapper = Mapper::new(self.mapper.clone())?;
        Ok(Numericalizer::new(tokenizer, mapper))
    }

    /// Builds the merged numericalizer model.
    pub fn compile(&self) -> Result<Model, Error> {
        let model = self.numericalizer()?.build()?;
        log::debug!(
            "Compiled pipeline into {} ({} nodes)",
            model.graph().name(),
            model.graph().nodes().len()
        );
        Ok(model)
    }
}
