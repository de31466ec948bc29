// ============================================================
// Layer 3 — EncodedExample Domain Type
// ============================================================
// One row of the pre-tokenised dataset:
//
//   id | toxic | lang | input_word_ids | input_mask | all_segment_id
//
// The three integer sequences always have the same fixed length
// (the sequence length the data was encoded with, 128 by default).
// Training and validation rows carry a label; test rows carry an
// identifier instead. Validation rows also carry a language code.

use serde::{Deserialize, Serialize};

/// Sequence length the Jigsaw multilingual data is encoded with.
pub const DEFAULT_SEQ_LEN: usize = 128;

/// A single pre-tokenised comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedExample {
    /// Original row identifier, kept verbatim as a string
    pub id: Option<String>,

    /// Toxicity target in [0, 1]
    pub label: Option<f32>,

    /// ISO language code of the comment (validation / test sets)
    pub lang: Option<String>,

    /// WordPiece ids: [CLS] tokens... [SEP] [PAD]...
    pub input_word_ids: Vec<u32>,

    /// 1 = real token, 0 = padding
    pub input_mask: Vec<u32>,

    /// Segment (token type) ids, all 0 for single-sentence input
    pub segment_ids: Vec<u32>,
}

impl EncodedExample {
    /// Length of the encoded sequences.
    pub fn seq_len(&self) -> usize {
        self.input_word_ids.len()
    }

    /// Binary view of the label; `None` for unlabeled rows.
    pub fn is_toxic(&self) -> Option<bool> {
        self.label.map(|l| l >= 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(label: Option<f32>) -> EncodedExample {
        EncodedExample {
            id:             Some("7".into()),
            label,
            lang:           None,
            input_word_ids: vec![101, 2023, 102, 0],
            input_mask:     vec![1, 1, 1, 0],
            segment_ids:    vec![0, 0, 0, 0],
        }
    }

    #[test]
    fn test_seq_len_counts_padding() {
        assert_eq!(example(None).seq_len(), 4);
    }

    #[test]
    fn test_is_toxic_thresholds_at_half() {
        assert_eq!(example(Some(0.5)).is_toxic(), Some(true));
        assert_eq!(example(Some(0.2)).is_toxic(), Some(false));
        assert_eq!(example(None).is_toxic(), None);
    }
}
