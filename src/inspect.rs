use crate::common::LabelSequence;
use crate::encoder::Encoder;
use crate::error::Result;

/// Label ids that can be decoded: sentinels and pad placeholders removed.
pub fn visible_label_ids(labels: &[i64], pad_token_id: u32) -> Vec<u32> {
    labels
        .iter()
        .filter_map(|&label| u32::try_from(label).ok())
        .filter(|&id| id != pad_token_id)
        .collect()
}

/// Human-readable dump of one packed row, for eyeballing a preprocessed dataset.
pub fn render_example<E: Encoder>(
    input_ids: &[u32],
    labels: &LabelSequence,
    encoder: &E,
) -> Result<String> {
    let inputs = encoder.decode(input_ids)?;
    let decoded_labels = encoder.decode(&visible_label_ids(labels, encoder.pad_token_id()?))?;
    Ok(format!(
        "input_ids {input_ids:?}\ninputs {inputs}\nlabel_ids {labels:?}\nlabels {decoded_labels}"
    ))
}
