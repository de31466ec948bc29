// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Rebuilds the fine-tuned classifier from a checkpoint directory
// and writes a submission for a processed test CSV:
//   1. Read model_config.json + latest weights
//   2. Load the unlabeled test set (every row needs an id)
//   3. Score in input order and write id,toxic rows

use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::path::PathBuf;

use crate::data::csv_source::CsvExampleSource;
use crate::domain::example::EncodedExample;
use crate::domain::traits::{ExampleSource, ToxicityScorer};
use crate::infra::{checkpoint::CheckpointManager, submission::write_submission_file};
use crate::ml::{predictor::Predictor, InferBackend};

/// Identifier of every example, in order. Fails on the first row without one.
pub fn example_ids(examples: &[EncodedExample]) -> Result<Vec<String>> {
    examples
        .iter()
        .enumerate()
        .map(|(i, e)| {
            e.id.clone()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| anyhow!("test example {} has no id", i + 1))
        })
        .collect()
}

pub struct PredictUseCase {
    checkpoint_dir:  PathBuf,
    test_csv:        PathBuf,
    submission_path: PathBuf,
    batch_size:      usize,
    /// Falls back to the sequence length recorded in run_config.json
    seq_len:         Option<usize>,
}

impl PredictUseCase {
    pub fn new(
        checkpoint_dir:  PathBuf,
        test_csv:        PathBuf,
        submission_path: PathBuf,
        batch_size:      usize,
        seq_len:         Option<usize>,
    ) -> Self {
        Self { checkpoint_dir, test_csv, submission_path, batch_size, seq_len }
    }

    /// Returns the number of rows written.
    pub fn execute(&self) -> Result<usize> {
        let device = Default::default();
        self.run::<InferBackend>(&device)
    }

    pub fn run<B: Backend>(&self, device: &B::Device) -> Result<usize> {
        let ckpt = CheckpointManager::new(&self.checkpoint_dir)?;
        let seq_len = match self.seq_len {
            Some(n) => n,
            None => ckpt.load_run_config()?.seq_len,
        };

        let model = ckpt.restore::<B>(device)?;

        let test = CsvExampleSource::unlabelled(&self.test_csv)
            .with_seq_len(seq_len)
            .load_all()?;
        let ids = example_ids(&test)?;

        let probabilities = Predictor::new(model, self.batch_size).score(&test)?;
        write_submission_file(&self.submission_path, &ids, &probabilities)?;
        Ok(probabilities.len())
    }
}
