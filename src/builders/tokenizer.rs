//! Tokenizer graph builder: raw text to normalized tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MICROSOFT_DOMAIN, OnnxVersion, default_opset_imports};
use crate::errors::{ConfigError, StructuralError};
use crate::graph::{Dim, ElementType, Graph, Model, Node, TensorDescriptor};

/// Name of the raw text input.
pub const INPUT_NAME: &str = "string_input";
/// Name of the intermediate split tokens.
pub const SPLIT_NAME: &str = "string_split";
/// Name of the normalized token output.
pub const OUTPUT_NAME: &str = "string_normalized";

/// Case transform applied by `StringNormalizer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseChangeAction {
    #[default]
    Lower,
    Upper,
    None,
}

impl CaseChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseChangeAction::Lower => "LOWER",
            CaseChangeAction::Upper => "UPPER",
            CaseChangeAction::None => "NONE",
        }
    }
}

impl FromStr for CaseChangeAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOWER" => Ok(CaseChangeAction::Lower),
            "UPPER" => Ok(CaseChangeAction::Upper),
            "NONE" => Ok(CaseChangeAction::None),
            other => Err(ConfigError::InvalidCaseChangeAction {
                action: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CaseChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Case transform applied after stopword removal.
    pub case_change_action: CaseChangeAction,
    /// Literal strings the text is split on.
    pub separators: Vec<String>,
    /// Tokens dropped during normalization.
    pub stopwords: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            case_change_action: CaseChangeAction::Lower,
            separators: vec![" ".to_string()],
            stopwords: vec![String::new()],
        }
    }
}

impl TokenizerConfig {
    /// Creates a TokenizerConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the case change action.
    pub fn case_change_action(mut self, action: CaseChangeAction) -> Self {
        self.case_change_action = action;
        self
    }

    /// Sets the separators.
    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the stopwords.
    pub fn stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = stopwords.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.separators.is_empty() {
            return Err(ConfigError::NoSeparators);
        }
        if self.separators.iter().any(String::is_empty) {
            return Err(ConfigError::EmptySeparator);
        }
        Ok(())
    }
}

/// Builds the text-splitting and normalization graph.
///
/// # Example
///
/// ```
/// use numericalizer::builders::{CaseChangeAction, Tokenizer, TokenizerConfig};
///
/// let tokenizer = Tokenizer::new(
///     TokenizerConfig::new()
///         .case_change_action(CaseChangeAction::Lower)
///         .stopwords(["the"]),
/// )
/// .unwrap();
///
/// let graph = tokenizer.build().unwrap();
/// assert_eq!(graph.nodes().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Creates a tokenizer, validating the configuration.
    pub fn new(config: TokenizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Replaces the whole configuration.
    pub fn set_config(&mut self, config: TokenizerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_case_change_action(&mut self, action: CaseChangeAction) {
        self.config.case_change_action = action;
    }

    pub fn set_separators(&mut self, separators: Vec<String>) -> Result<(), ConfigError> {
        let config = TokenizerConfig {
            separators,
            ..self.config.clone()
        };
        self.set_config(config)
    }

    pub fn set_stopwords(&mut self, stopwords: Vec<String>) {
        self.config.stopwords = stopwords;
    }

    /// Emits the two-node tokenizer graph.
    ///
    /// `string_input` (STRING `[1]`) is split by `Tokenizer` into
    /// `string_split`, which `StringNormalizer` turns into
    /// `string_normalized` (STRING `[1, ?]`).
    pub fn build(&self) -> Result<Graph, StructuralError> {
        let string_input = TensorDescriptor::new(INPUT_NAME, ElementType::String, vec![Dim::Fixed(1)])?;
        let string_normalized = TensorDescriptor::new(
            OUTPUT_NAME,
            ElementType::String,
            vec![Dim::Fixed(1), Dim::Unbound],
        )?;

        let split_node = Node::new("Tokenizer", [INPUT_NAME], [SPLIT_NAME])?
            .with_domain(MICROSOFT_DOMAIN)
            .with_attr("mark", 0i64)
            .with_attr("mincharnum", 1i64)
            .with_attr("pad_value", "")
            .with_attr("separators", self.config.separators.clone());

        let normalizer_node = Node::new("StringNormalizer", [SPLIT_NAME], [OUTPUT_NAME])?
            .with_attr("case_change_action", self.config.case_change_action.as_str())
            .with_attr("stopwords", self.config.stopwords.clone());

        let mut assembler = Graph::assembler("tokenizer_graph");
        assembler.add_input(string_input)?;
        assembler.add_node(split_node)?;
        assembler.add_node(normalizer_node)?;
        assembler.add_output(string_normalized);
        assembler.finish()
    }

    /// Wraps [`build`](Self::build) in a model with the default opset imports.
    pub fn model(&self) -> Result<Model, StructuralError> {
        Model::new(self.build()?, default_opset_imports(), OnnxVersion::IR_VERSION)
    }
}
