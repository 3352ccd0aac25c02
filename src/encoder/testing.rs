// Deterministic encoder for tests: text is whitespace-separated token ids.
use pyo3::prelude::*;
use std::ffi::CStr;

use super::{BatchEncoding, Encoder, PromptBuilder};
use crate::common::{Sequence, TruncationSide};
use crate::error::{PackError, Result};

pub struct IdEncoder {
    pub pad_token_id: u32,
    pub eos_token_id: u32,
    /// Prepended when `add_special_tokens` is set.
    pub special_prefix: Sequence,
    /// Prepended to every query by `build_prompt`.
    pub prompt_prefix: String,
}

impl IdEncoder {
    pub fn new(pad_token_id: u32, eos_token_id: u32) -> Self {
        IdEncoder {
            pad_token_id,
            eos_token_id,
            special_prefix: Vec::new(),
            prompt_prefix: String::new(),
        }
    }

    fn tokenize(&self, text: &str) -> Result<Sequence> {
        text.split_whitespace()
            .map(|tok| {
                tok.parse::<u32>()
                    .map_err(|_| PackError::Encoder(format!("unknown token '{tok}'")))
            })
            .collect()
    }
}

impl PromptBuilder for IdEncoder {
    fn build_prompt(&self, query: &str) -> Result<String> {
        Ok(format!("{}{}", self.prompt_prefix, query))
    }
}

impl Encoder for IdEncoder {
    fn encode(
        &self,
        text: &str,
        add_special_tokens: bool,
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<Sequence> {
        let mut ids = if add_special_tokens {
            self.special_prefix.clone()
        } else {
            Vec::new()
        };
        ids.extend(self.tokenize(text)?);
        truncation_side.truncate(&mut ids, max_length);
        Ok(ids)
    }

    fn batch_encode(
        &self,
        texts: &[String],
        max_length: usize,
        truncation_side: TruncationSide,
    ) -> Result<BatchEncoding> {
        let rows = texts
            .iter()
            .map(|text| self.encode(text, true, max_length, truncation_side))
            .collect::<Result<Vec<_>>>()?;
        let longest = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut batch = BatchEncoding::default();
        for mut row in rows {
            let pad_len = longest - row.len();
            let mut mask = vec![1u8; row.len()];
            row.extend(vec![self.pad_token_id; pad_len]);
            mask.extend(vec![0u8; pad_len]);
            batch.input_ids.push(row);
            batch.attention_mask.push(mask);
        }
        Ok(batch)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        Ok(ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn pad_token_id(&self) -> Result<u32> {
        Ok(self.pad_token_id)
    }

    fn eos_token_id(&self) -> Result<u32> {
        Ok(self.eos_token_id)
    }
}

// Same id-per-word scheme as a HuggingFace-style Python object. `build_prompt`
// prepends token 9; `calls` records which text keyword each batch call used.
const FAKE_TOKENIZER: &CStr = c"
class Tok:
    pad_token_id = 0
    eos_token_id = 2

    def __init__(self, with_mask):
        self.truncation_side = 'right'
        self.with_mask = with_mask
        self.broken_mask = False
        self.calls = []

    def build_prompt(self, query):
        return '9 ' + query

    def _ids(self, text, max_length):
        ids = [int(tok) for tok in text.split()]
        if max_length is not None and len(ids) > max_length:
            if self.truncation_side == 'left':
                ids = ids[len(ids) - max_length:]
            else:
                ids = ids[:max_length]
        return ids

    def encode(self, text, add_special_tokens=True, truncation=True, max_length=None):
        return self._ids(text, max_length)

    def __call__(self, text=None, text_target=None, max_length=None, truncation=True, padding=True):
        texts = text if text is not None else text_target
        self.calls.append('text' if text is not None else 'text_target')
        rows = [self._ids(t, max_length) for t in texts]
        longest = max(len(row) for row in rows)
        pad = self.pad_token_id if self.pad_token_id is not None else 0
        out = BrokenMask() if self.broken_mask else {}
        out['input_ids'] = [row + [pad] * (longest - len(row)) for row in rows]
        if self.with_mask:
            out['attention_mask'] = [[1] * len(row) + [0] * (longest - len(row)) for row in rows]
        return out

    def decode(self, ids):
        return ' '.join(str(i) for i in ids)


class BrokenMask(dict):
    def __getitem__(self, key):
        if key == 'attention_mask':
            raise RuntimeError('mask unavailable')
        return dict.__getitem__(self, key)
";

pub fn fake_tokenizer(py: Python<'_>, with_mask: bool) -> Bound<'_, PyAny> {
    PyModule::from_code(py, FAKE_TOKENIZER, c"fake_tokenizer.py", c"fake_tokenizer")
        .unwrap()
        .getattr("Tok")
        .unwrap()
        .call1((with_mask,))
        .unwrap()
}
