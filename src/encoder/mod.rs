//! Tokenizer capabilities consumed by the packers.
//!
//! The packers never look inside the tokenizer: they only need a prompt
//! template and text-to-id encoding. Truncation side is an argument of every
//! call so no encode depends on a setting left behind by an earlier one.

pub mod python;
#[cfg(test)]
pub(crate) mod testing;

use crate::common::{Sequence, TruncationSide};
use crate::error::Result;

/// Turns a raw query into the formatted prompt the model expects.
pub trait PromptBuilder {
    fn build_prompt(&self, query: &str) -> Result<String>;
}

/// Right-padded batch encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchEncoding {
    pub input_ids: Vec<Sequence>,
    /// 1 for real tokens, 0 for padding; same shape as `input_ids`.
    pub attention_mask: Vec<Vec<u8>>,
}

pub trait Encoder {
    /// Encode one text, truncating to `max_length` tokens.
    fn encode(
        &self,
        text: &str,
        add_special_tokens: bool,
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<Sequence>;

    /// Encode a batch, truncating each row to `max_length` and right-padding
    /// every row to the longest one.
    fn batch_encode(
        &self,
        texts: &[String],
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<BatchEncoding>;

    /// Batch-encode label texts. Tokenizers with a separate target mode
    /// switch to it here; everything else encodes them like inputs.
    fn batch_encode_targets(
        &self,
        texts: &[String],
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<BatchEncoding> {
        self.batch_encode(texts, max_length, truncation_side)
    }

    fn decode(&self, ids: &[u32]) -> Result<String>;

    fn pad_token_id(&self) -> Result<u32>;

    fn eos_token_id(&self) -> Result<u32>;
}
