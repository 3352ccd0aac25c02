use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::{BatchEncoding, Encoder, PromptBuilder};
use crate::common::{Sequence, TruncationSide, INPUT_IDS_KEY};
use crate::error::{PackError, Result};

/// Adapter over a HuggingFace-style Python tokenizer object.
///
/// The tokenizer's `truncation_side` attribute is shared state: it is set
/// right before each encode and put back afterwards. Calls run under the GIL,
/// but one tokenizer object must not be driven from several threads that
/// release it in between.
pub struct PyTokenizer<'py> {
    inner: Bound<'py, PyAny>,
}

impl<'py> PyTokenizer<'py> {
    pub fn new(inner: Bound<'py, PyAny>) -> Self {
        PyTokenizer { inner }
    }

    fn with_truncation_side<T>(
        &self,
        side: TruncationSide,
        call: impl FnOnce(&Bound<'py, PyAny>) -> Result<T>,
    ) -> Result<T> {
        let previous = self.inner.getattr("truncation_side")?;
        self.inner.setattr("truncation_side", side.as_str())?;
        let result = call(&self.inner);
        self.inner.setattr("truncation_side", previous)?;
        result
    }

    fn token_id(&self, attr: &str) -> Result<u32> {
        self.inner
            .getattr(attr)?
            .extract::<Option<u32>>()?
            .ok_or_else(|| PackError::Encoder(format!("tokenizer has no {attr}")))
    }

    /// `tokenizer(<text_key>=texts, ...)` with padding, then the ids and mask.
    fn call_padded(
        &self,
        text_key: &str,
        texts: &[String],
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<BatchEncoding> {
        self.with_truncation_side(truncation_side, |tokenizer| {
            let kwargs = PyDict::new(tokenizer.py());
            kwargs.set_item(text_key, texts.to_vec())?;
            kwargs.set_item("max_length", max_length)?;
            kwargs.set_item("truncation", true)?;
            kwargs.set_item("padding", true)?;
            let encoded = tokenizer.call((), Some(&kwargs))?;

            let input_ids: Vec<Sequence> = encoded.get_item(INPUT_IDS_KEY)?.extract()?;
            let attention_mask = match encoded.get_item("attention_mask") {
                Ok(mask) => mask.extract()?,
                // Tokenizers configured without masks: padding is whatever equals the pad id
                Err(err) if err.is_instance_of::<PyKeyError>(tokenizer.py()) => {
                    let pad_token_id = self.pad_token_id()?;
                    input_ids
                        .iter()
                        .map(|row| row.iter().map(|&id| u8::from(id != pad_token_id)).collect())
                        .collect()
                }
                Err(err) => return Err(err.into()),
            };
            Ok(BatchEncoding {
                input_ids,
                attention_mask,
            })
        })
    }
}

impl PromptBuilder for PyTokenizer<'_> {
    fn build_prompt(&self, query: &str) -> Result<String> {
        Ok(self
            .inner
            .call_method1("build_prompt", (query,))?
            .extract()?)
    }
}

impl Encoder for PyTokenizer<'_> {
    fn encode(
        &self,
        text: &str,
        add_special_tokens: bool,
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<Sequence> {
        self.with_truncation_side(truncation_side, |tokenizer| {
            let kwargs = PyDict::new(tokenizer.py());
            kwargs.set_item("text", text)?;
            kwargs.set_item("add_special_tokens", add_special_tokens)?;
            kwargs.set_item("truncation", true)?;
            kwargs.set_item("max_length", max_length)?;
            Ok(tokenizer.call_method("encode", (), Some(&kwargs))?.extract()?)
        })
    }

    fn batch_encode(
        &self,
        texts: &[String],
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<BatchEncoding> {
        self.call_padded("text", texts, max_length, truncation_side)
    }

    fn batch_encode_targets(
        &self,
        texts: &[String],
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<BatchEncoding> {
        self.call_padded("text_target", texts, max_length, truncation_side)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        Ok(self
            .inner
            .call_method1("decode", (ids.to_vec(),))?
            .extract()?)
    }

    fn pad_token_id(&self) -> Result<u32> {
        self.token_id("pad_token_id")
    }

    fn eos_token_id(&self) -> Result<u32> {
        self.token_id("eos_token_id")
    }
}
