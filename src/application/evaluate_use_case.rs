// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Restores a fine-tuned checkpoint and reports loss / AUC /
// accuracy on a labelled CSV, once for the combined set and once
// per language. Reports are appended to metrics.csv in the
// checkpoint directory under the "checkpoint" phase.

use anyhow::Result;
use burn::prelude::*;
use std::path::PathBuf;

use crate::data::{csv_source::CsvExampleSource, dataset::ToxicDataset};
use crate::domain::{language::LanguageFilter, traits::ExampleSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EvalReport, MetricsLogger},
};
use crate::ml::{evaluator::evaluate_languages, InferBackend};

pub struct EvaluateUseCase {
    checkpoint_dir: PathBuf,
    data_csv:       PathBuf,
    languages:      Vec<String>,
    batch_size:     usize,
    seq_len:        Option<usize>,
    label_column:   Option<String>,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint_dir: PathBuf,
        data_csv:       PathBuf,
        languages:      Vec<String>,
        batch_size:     usize,
    ) -> Self {
        Self {
            checkpoint_dir,
            data_csv,
            languages,
            batch_size,
            seq_len: None,
            label_column: None,
        }
    }

    /// Override the sequence length recorded at training time.
    pub fn with_seq_len(mut self, seq_len: Option<usize>) -> Self {
        self.seq_len = seq_len;
        self
    }

    pub fn with_label_column(mut self, column: Option<String>) -> Self {
        self.label_column = column;
        self
    }

    pub fn execute(&self) -> Result<Vec<EvalReport>> {
        let device = Default::default();
        self.run::<InferBackend>(&device)
    }

    pub fn run<B: Backend>(&self, device: &B::Device) -> Result<Vec<EvalReport>> {
        let ckpt = CheckpointManager::new(&self.checkpoint_dir)?;

        // Missing values come from the run that produced the checkpoint
        let (seq_len, label_column) = match (self.seq_len, &self.label_column) {
            (Some(n), Some(col)) => (n, col.clone()),
            (seq_len, label_column) => {
                let run = ckpt.load_run_config()?;
                (
                    seq_len.unwrap_or(run.seq_len),
                    label_column.clone().unwrap_or(run.label_column),
                )
            }
        };

        let model = ckpt.restore::<B>(device)?;
        let data = ToxicDataset::new(
            CsvExampleSource::labelled(&self.data_csv)
                .with_seq_len(seq_len)
                .with_label_column(label_column)
                .load_all()?,
        );

        let metrics = MetricsLogger::new(&self.checkpoint_dir)?;
        evaluate_languages(
            &model,
            &data,
            &LanguageFilter::evaluation_set(&self.languages),
            self.batch_size,
            "checkpoint",
            Some(&metrics),
        )
    }
}
