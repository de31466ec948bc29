// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `benchmark`, `evaluate`,
// `predict` and `encode`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, PathBuf, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::benchmark_use_case::BenchmarkConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate, fine-tune on English, evaluate again and write a submission
    Benchmark(BenchmarkArgs),

    /// Report per-language metrics for a saved checkpoint
    Evaluate(EvaluateArgs),

    /// Write a submission file from a saved checkpoint
    Predict(PredictArgs),

    /// Tokenize a raw-text CSV into the processed input format
    Encode(EncodeArgs),
}

/// All arguments for the `benchmark` command.
#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    /// Processed English training comments
    #[arg(long, default_value = "data/jigsaw-toxic-comment-train-processed-seqlen128.csv")]
    pub train_csv: PathBuf,

    /// Processed multilingual validation comments (with a `lang` column)
    #[arg(long, default_value = "data/validation-processed-seqlen128.csv")]
    pub validation_csv: PathBuf,

    /// Processed unlabeled test comments (with an `id` column)
    #[arg(long, default_value = "data/test-processed-seqlen128.csv")]
    pub test_csv: PathBuf,

    /// Directory for checkpoints, configs and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Where to write the id,toxic submission
    #[arg(long, default_value = "submission.csv")]
    pub submission: PathBuf,

    /// Local directory with config.json and model.safetensors
    #[arg(long)]
    pub pretrained_dir: Option<PathBuf>,

    /// Hugging Face model id used when --pretrained-dir is not given
    #[arg(long, default_value = crate::infra::pretrained::DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Hugging Face hub cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Use the pretrained architecture with random weights
    #[arg(long)]
    pub random_init: bool,

    /// Length of every integer-list column
    #[arg(long, default_value_t = 128)]
    pub seq_len: usize,

    /// Name of the 0/1 label column
    #[arg(long, default_value = "toxic")]
    pub label_column: String,

    /// Validation languages reported individually next to the combined set
    #[arg(long, value_delimiter = ',', default_value = "es,it,tr")]
    pub languages: Vec<String>,

    /// Number of comments processed together in one forward pass
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-5)]
    pub lr: f64,

    /// Cap on optimiser steps per epoch
    #[arg(long)]
    pub steps_per_epoch: Option<usize>,

    /// Cap on validation batches per epoch
    #[arg(long)]
    pub validation_steps: Option<usize>,

    /// Shuffle seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Train only the classification head, keep BERT fixed
    #[arg(long)]
    pub freeze_encoder: bool,
}

/// Convert CLI BenchmarkArgs into the application-layer BenchmarkConfig.
/// The application layer never sees clap types.
impl From<BenchmarkArgs> for BenchmarkConfig {
    fn from(a: BenchmarkArgs) -> Self {
        BenchmarkConfig {
            train_csv:         a.train_csv,
            validation_csv:    a.validation_csv,
            test_csv:          a.test_csv,
            checkpoint_dir:    a.checkpoint_dir,
            submission_path:   a.submission,
            pretrained_dir:    a.pretrained_dir,
            model_id:          a.model_id,
            cache_dir:         a.cache_dir,
            random_init:       a.random_init,
            seq_len:           a.seq_len,
            label_column:      a.label_column,
            languages:         a.languages,
            batch_size:        a.batch_size,
            epochs:            a.epochs,
            lr:                a.lr,
            steps_per_epoch:   a.steps_per_epoch,
            validation_steps:  a.validation_steps,
            seed:              a.seed,
            num_workers:       a.num_workers,
            trainable_encoder: !a.freeze_encoder,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled processed CSV to score
    #[arg(long, default_value = "data/validation-processed-seqlen128.csv")]
    pub data_csv: PathBuf,

    /// Directory written by `benchmark`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, value_delimiter = ',', default_value = "es,it,tr")]
    pub languages: Vec<String>,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Defaults to the value saved in run_config.json
    #[arg(long)]
    pub seq_len: Option<usize>,

    /// Defaults to the value saved in run_config.json
    #[arg(long)]
    pub label_column: Option<String>,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Processed unlabeled CSV with an `id` column
    #[arg(long, default_value = "data/test-processed-seqlen128.csv")]
    pub test_csv: PathBuf,

    /// Directory written by `benchmark`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, default_value = "submission.csv")]
    pub submission: PathBuf,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Defaults to the value saved in run_config.json
    #[arg(long)]
    pub seq_len: Option<usize>,
}

/// All arguments for the `encode` command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Raw CSV with a text column
    #[arg(long)]
    pub input: PathBuf,

    /// Processed CSV to write
    #[arg(long)]
    pub output: PathBuf,

    /// Hugging Face tokenizer.json; fetched for --model-id when omitted
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    #[arg(long, default_value = crate::infra::pretrained::DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Text column; `comment_text` then `content` are tried by default
    #[arg(long)]
    pub text_column: Option<String>,

    #[arg(long, default_value_t = 128)]
    pub seq_len: usize,
}
