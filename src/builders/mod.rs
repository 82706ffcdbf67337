//! Graph builders for the preprocessing pipeline.
//!
//! - [`Tokenizer`] splits raw text and normalizes the tokens.
//! - [`Mapper`] maps tokens to a fixed-width vector of vocabulary ids.
//! - [`Numericalizer`] splices the two into a single model.
//!
//! Builders own their configuration and validate it up front; `build()` is a
//! pure function of that configuration and returns a fresh value each call.

mod mapper;
mod numericalizer;
mod tokenizer;
mod vocabulary;

pub use mapper::{Mapper, MapperConfig};
pub use numericalizer::Numericalizer;
pub use tokenizer::{CaseChangeAction, Tokenizer, TokenizerConfig};
pub use vocabulary::{OOV_SENTINELS, Vocabulary};
