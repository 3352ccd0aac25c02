pub mod eval;
pub mod train;

pub use eval::EvalPacker;
pub use train::TrainPacker;

use crate::common::MaskedLabel;

/// Label row for an eval target: padded positions (mask 0) are ignored.
fn mask_padding(ids: &[u32], attention_mask: &[u8]) -> Vec<MaskedLabel> {
    ids.iter()
        .zip(attention_mask.iter())
        .map(|(&id, &keep)| {
            if keep == 0 {
                MaskedLabel::Ignored
            } else {
                MaskedLabel::Token(id)
            }
        })
        .collect()
}
