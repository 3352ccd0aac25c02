use crate::batch::RecordBatch;
use crate::common::{resolve_labels, EncodedPair, MaskedLabel, PackedExample, PackedTable, Record};
use crate::config::PreprocessConfig;
use crate::encoder::{Encoder, PromptBuilder};
use crate::error::{PackError, Result};

/// Builds fixed-length training rows:
/// `prompt ++ response ++ [eos] ++ [pad]...`, with labels that only keep the
/// response and eos positions.
pub struct TrainPacker<'a> {
    config: &'a PreprocessConfig,
}

impl<'a> TrainPacker<'a> {
    pub fn new(config: &'a PreprocessConfig) -> Self {
        TrainPacker { config }
    }

    fn encode_record<T>(&self, record: &Record, tokenizer: &T) -> Result<EncodedPair>
    where
        T: Encoder + PromptBuilder,
    {
        let prompt = tokenizer.build_prompt(&record.prompt)?;
        let side = self.config.train_truncation_side;
        let prompt_ids = tokenizer.encode(&prompt, true, self.config.max_source_length, side)?;
        let response_ids =
            tokenizer.encode(&record.response, false, self.config.max_target_length, side)?;
        Ok(EncodedPair {
            prompt_ids,
            response_ids,
        })
    }

    fn assemble(
        &self,
        pair: EncodedPair,
        pad_token_id: u32,
        eos_token_id: u32,
    ) -> Result<PackedExample> {
        let max_seq_length = self.config.max_seq_length();
        let context_length = pair.prompt_ids.len();

        let mut input_ids = pair.prompt_ids;
        input_ids.extend(&pair.response_ids);
        input_ids.push(eos_token_id);

        let mut labels = vec![MaskedLabel::Ignored; context_length];
        labels.extend(pair.response_ids.iter().map(|&id| MaskedLabel::Token(id)));
        labels.push(MaskedLabel::Token(eos_token_id));

        // Never clip here: an over-long row means the length budget is wrong
        if input_ids.len() > max_seq_length {
            log::warn!(
                "packed example of {} tokens exceeds max_source_length + max_target_length = {}",
                input_ids.len(),
                max_seq_length
            );
            return Err(PackError::PackingOverflow {
                length: input_ids.len(),
                max_length: max_seq_length,
            });
        }
        let pad_len = max_seq_length - input_ids.len();
        input_ids.extend(vec![pad_token_id; pad_len]);
        labels.extend(vec![MaskedLabel::Ignored; pad_len]);

        Ok(PackedExample {
            input_ids,
            labels: resolve_labels(&labels, pad_token_id, self.config.ignore_pad_token_for_loss),
        })
    }

    pub fn pack_record<T>(&self, record: &Record, tokenizer: &T) -> Result<PackedExample>
    where
        T: Encoder + PromptBuilder,
    {
        let pair = self.encode_record(record, tokenizer)?;
        self.assemble(pair, tokenizer.pad_token_id()?, tokenizer.eos_token_id()?)
    }

    pub fn process<T>(&self, batch: &RecordBatch, tokenizer: &T) -> Result<PackedTable>
    where
        T: Encoder + PromptBuilder,
    {
        let records = batch.retained();
        let pad_token_id = tokenizer.pad_token_id()?;
        let eos_token_id = tokenizer.eos_token_id()?;

        let mut table = PackedTable::with_capacity(records.len());
        for record in &records {
            let pair = self.encode_record(record, tokenizer)?;
            table.push(self.assemble(pair, pad_token_id, eos_token_id)?);
        }
        log::debug!(
            "packed {} training rows of length {}",
            table.len(),
            self.config.max_seq_length()
        );
        Ok(table)
    }
}
