// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the multilingual BERT WordPiece tokenizer (tokenizer.json)
// and turns raw comments into the fixed-length encoding the
// processed CSV files use:
//
//   input_word_ids:  [CLS] tokens... [SEP] [PAD]...
//   input_mask:      1 for every real token, 0 for padding
//   all_segment_id:  0 everywhere (single-sentence input)
//
// Truncation and padding are configured on the tokenizer itself.

use anyhow::{anyhow, Result};
use std::path::Path;
use tokenizers::{
    PaddingParams, PaddingStrategy, Tokenizer, TruncationParams,
};

use crate::domain::example::EncodedExample;

pub struct TokenizerStore {
    tokenizer: Tokenizer,
    seq_len:   usize,
}

impl TokenizerStore {
    /// Load `tokenizer.json` and fix its output length to `seq_len`.
    pub fn load(path: impl AsRef<Path>, seq_len: usize) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?;
        Self::from_tokenizer(tokenizer, seq_len)
    }

    pub fn from_tokenizer(mut tokenizer: Tokenizer, seq_len: usize) -> Result<Self> {
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: seq_len,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Cannot configure truncation: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy:  PaddingStrategy::Fixed(seq_len),
            pad_id,
            pad_token: "[PAD]".to_string(),
            ..Default::default()
        }));

        tracing::debug!("Tokenizer ready (seq_len={}, pad_id={})", seq_len, pad_id);
        Ok(Self { tokenizer, seq_len })
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Encode one comment with special tokens added.
    pub fn encode(&self, text: &str) -> Result<EncodedExample> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        Ok(EncodedExample {
            id:             None,
            label:          None,
            lang:           None,
            input_word_ids: encoding.get_ids().to_vec(),
            input_mask:     encoding.get_attention_mask().to_vec(),
            segment_ids:    encoding.get_type_ids().to_vec(),
        })
    }
}
