// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `benchmark` — evaluate, fine-tune, evaluate, write submission
//   2. `evaluate`  — per-language metrics for a saved checkpoint
//   3. `predict`   — submission file from a saved checkpoint
//   4. `encode`    — raw text CSV → pre-tokenized CSV
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BenchmarkArgs, Commands, EncodeArgs, EvaluateArgs, PredictArgs};

/// The main CLI struct; clap generates the argument parser from it.
#[derive(Parser, Debug)]
#[command(
    name = "multilingual-toxicity",
    version = "0.1.0",
    about = "Fine-tune multilingual BERT on English toxic comments and measure zero-shot transfer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Benchmark(args) => run_benchmark(args),
            Commands::Evaluate(args)  => run_evaluate(args),
            Commands::Predict(args)   => run_predict(args),
            Commands::Encode(args)    => run_encode(args),
        }
    }
}

/// Converts the args into a BenchmarkConfig and hands off to Layer 2.
fn run_benchmark(args: BenchmarkArgs) -> Result<()> {
    use crate::application::benchmark_use_case::BenchmarkUseCase;

    tracing::info!("Starting benchmark: training on '{}'", args.train_csv.display());
    let submission = args.submission.clone();

    let outcome = BenchmarkUseCase::new(args.into()).execute()?;

    println!("\nBenchmark complete.");
    for epoch in &outcome.epochs {
        println!(
            "  epoch {:>3}: {} steps, train_loss={:.4}, val_auc={}",
            epoch.epoch,
            epoch.steps,
            epoch.train_loss,
            fmt_auc(epoch.validation.as_ref().and_then(|v| v.auc))
        );
    }
    for (before, after) in outcome.before_training.iter().zip(&outcome.after_training) {
        println!(
            "  {:<9} AUC {} → {}",
            before.language,
            fmt_auc(before.auc),
            fmt_auc(after.auc)
        );
    }
    println!("Submission ({} rows) written to '{}'", outcome.predictions, submission.display());
    println!("Metrics logged to '{}'", outcome.metrics_csv.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let reports = EvaluateUseCase::new(args.checkpoint_dir, args.data_csv, args.languages, args.batch_size)
        .with_seq_len(args.seq_len)
        .with_label_column(args.label_column)
        .execute()?;
    println!("\nEvaluated {} subsets.", reports.len());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let submission = args.submission.clone();
    let rows = PredictUseCase::new(
        args.checkpoint_dir,
        args.test_csv,
        args.submission,
        args.batch_size,
        args.seq_len,
    )
    .execute()?;
    println!("Submission ({} rows) written to '{}'", rows, submission.display());
    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    use crate::application::encode_use_case::EncodeUseCase;
    use crate::infra::{pretrained::PretrainedFiles, tokenizer_store::TokenizerStore};

    let tokenizer_path = match args.tokenizer {
        Some(path) => path,
        None => PretrainedFiles::fetch_tokenizer(&args.model_id, None)?,
    };
    let tokenizer = TokenizerStore::load(&tokenizer_path, args.seq_len)?;

    let output = args.output.clone();
    let rows = EncodeUseCase::new(args.input, args.output, args.text_column).execute(&tokenizer)?;
    println!("Encoded {} rows into '{}'", rows, output.display());
    Ok(())
}

fn fmt_auc(auc: Option<f64>) -> String {
    auc.map(|a| format!("{a:.4}")).unwrap_or_else(|| "n/a".into())
}
