// Types and common enums should be defined here

// Sequence usually refers to token ids produced by the encoder
pub type Sequence = Vec<u32>;
// Labels are signed so the loss-ignore sentinel fits next to real token ids
pub type LabelSequence = Vec<i64>;

/// Label value the training loop skips when computing the loss.
pub const IGNORE_INDEX: i64 = -100;

pub const INPUT_IDS_KEY: &str = "input_ids";
pub const LABELS_KEY: &str = "labels";

/// Which end of an over-long sequence the encoder cuts off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationSide {
    /// Drop leading tokens, keeping the tail.
    Left,
    /// Drop trailing tokens, keeping the head.
    Right,
}

impl TruncationSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruncationSide::Left => "left",
            TruncationSide::Right => "right",
        }
    }

    /// Cut `ids` down to at most `max_length` tokens from this side.
    pub fn truncate(&self, ids: &mut Sequence, max_length: usize) {
        if ids.len() <= max_length {
            return;
        }
        match self {
            TruncationSide::Left => {
                let excess = ids.len() - max_length;
                ids.drain(..excess);
            }
            TruncationSide::Right => ids.truncate(max_length),
        }
    }
}

impl std::str::FromStr for TruncationSide {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(TruncationSide::Left),
            "right" => Ok(TruncationSide::Right),
            _ => Err("Invalid truncation side"),
        }
    }
}

/// One label position before it is written out.
///
/// Prompt and padding positions are `Ignored` rather than carrying the pad id,
/// so a response token that happens to equal the pad id stays a real label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskedLabel {
    Token(u32),
    Ignored,
}

impl MaskedLabel {
    pub fn resolve(self, pad_token_id: u32, ignore_pad_token_for_loss: bool) -> i64 {
        match self {
            MaskedLabel::Token(id) => id as i64,
            MaskedLabel::Ignored if ignore_pad_token_for_loss => IGNORE_INDEX,
            MaskedLabel::Ignored => pad_token_id as i64,
        }
    }
}

pub fn resolve_labels(
    labels: &[MaskedLabel],
    pad_token_id: u32,
    ignore_pad_token_for_loss: bool,
) -> LabelSequence {
    labels
        .iter()
        .map(|label| label.resolve(pad_token_id, ignore_pad_token_for_loss))
        .collect()
}

/// A single (prompt, response) pair that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub prompt: String,
    pub response: String,
}

/// Encoder output for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPair {
    pub prompt_ids: Sequence,
    pub response_ids: Sequence,
}

/// One emitted row: token ids and the labels aligned to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedExample {
    pub input_ids: Sequence,
    pub labels: LabelSequence,
}

/// Output table, row-aligned with the retained input records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedTable {
    pub input_ids: Vec<Sequence>,
    pub labels: Vec<LabelSequence>,
}

impl PackedTable {
    pub fn with_capacity(rows: usize) -> Self {
        PackedTable {
            input_ids: Vec::with_capacity(rows),
            labels: Vec::with_capacity(rows),
        }
    }

    pub fn push(&mut self, example: PackedExample) {
        self.input_ids.push(example.input_ids);
        self.labels.push(example.labels);
    }

    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}
