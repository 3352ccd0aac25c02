use super::mask_padding;
use crate::batch::RecordBatch;
use crate::common::{resolve_labels, PackedTable};
use crate::config::PreprocessConfig;
use crate::encoder::{Encoder, PromptBuilder};
use crate::error::Result;

/// Builds generation-style eval rows: prompts and targets are batch-encoded
/// separately, each padded to its own longest row.
pub struct EvalPacker<'a> {
    config: &'a PreprocessConfig,
}

impl<'a> EvalPacker<'a> {
    pub fn new(config: &'a PreprocessConfig) -> Self {
        EvalPacker { config }
    }

    pub fn process<T>(&self, batch: &RecordBatch, tokenizer: &T) -> Result<PackedTable>
    where
        T: Encoder + PromptBuilder,
    {
        let records = batch.retained();
        if records.is_empty() {
            return Ok(PackedTable::default());
        }

        let mut prompts = Vec::with_capacity(records.len());
        let mut targets = Vec::with_capacity(records.len());
        for record in records {
            prompts.push(tokenizer.build_prompt(&record.prompt)?);
            targets.push(record.response);
        }

        // Left truncation keeps the end of the prompt, where the round markers sit
        let model_inputs = tokenizer.batch_encode(
            &prompts,
            self.config.max_source_length,
            self.config.eval_source_truncation_side,
        )?;
        let label_batch = tokenizer.batch_encode_targets(
            &targets,
            self.config.max_target_length,
            self.config.eval_target_truncation_side,
        )?;

        let pad_token_id = tokenizer.pad_token_id()?;
        let labels = label_batch
            .input_ids
            .iter()
            .zip(label_batch.attention_mask.iter())
            .map(|(ids, mask)| {
                resolve_labels(
                    &mask_padding(ids, mask),
                    pad_token_id,
                    self.config.ignore_pad_token_for_loss,
                )
            })
            .collect();

        log::debug!(
            "encoded {} eval rows ({} input tokens, {} label tokens per row)",
            model_inputs.input_ids.len(),
            model_inputs.input_ids.first().map_or(0, Vec::len),
            label_batch.input_ids.first().map_or(0, Vec::len)
        );
        Ok(PackedTable {
            input_ids: model_inputs.input_ids,
            labels,
        })
    }
}
