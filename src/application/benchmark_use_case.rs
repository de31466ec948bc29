// ============================================================
// Layer 2 — BenchmarkUseCase
// ============================================================
// Orchestrates the full zero-shot transfer benchmark in order:
//
//   Step 1: Load train / validation / test CSVs   (Layer 4 - data)
//   Step 2: Build BERT + classification head      (Layer 5 - ml)
//   Step 3: Load pretrained multilingual weights  (Layer 6 - infra)
//   Step 4: Save model + run config               (Layer 6 - infra)
//   Step 5: Evaluate per language (baseline)      (Layer 5 - ml)
//   Step 6: Fine-tune on English comments         (Layer 5 - ml)
//   Step 7: Evaluate per language again           (Layer 5 - ml)
//   Step 8: Score the test set, write submission  (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)
//            Devlin et al. (2019) BERT

use anyhow::{bail, Result};
use burn::{module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::predict_use_case::example_ids;
use crate::data::{csv_source::{CsvExampleSource, DEFAULT_LABEL_COLUMN}, dataset::ToxicDataset};
use crate::domain::{
    example::DEFAULT_SEQ_LEN,
    language::{LanguageFilter, VALIDATION_LANGUAGES},
    traits::{ExampleSource, ToxicityScorer},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EvalReport, MetricsLogger},
    pretrained::{PretrainedFiles, DEFAULT_MODEL_ID},
    submission::write_submission_file,
};
use crate::ml::{
    bert::BertConfig,
    evaluator::evaluate_languages,
    model::{ToxicClassifier, ToxicClassifierConfig},
    predictor::Predictor,
    trainer::{train, EpochSummary, TrainingOptions},
    TrainBackend,
};

// ─── Benchmark Configuration ─────────────────────────────────────────────────
// Every path and hyperparameter of one run. Saved next to the
// checkpoints as run_config.json so a run can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub train_csv:         PathBuf,
    pub validation_csv:    PathBuf,
    pub test_csv:          PathBuf,
    pub checkpoint_dir:    PathBuf,
    pub submission_path:   PathBuf,
    /// Local directory with config.json + model.safetensors.
    /// When unset the files are fetched from the hub by `model_id`.
    pub pretrained_dir:    Option<PathBuf>,
    pub model_id:          String,
    pub cache_dir:         Option<PathBuf>,
    /// Keep the pretrained architecture but skip loading its weights
    pub random_init:       bool,
    pub seq_len:           usize,
    pub label_column:      String,
    pub languages:         Vec<String>,
    pub batch_size:        usize,
    pub epochs:            usize,
    pub lr:                f64,
    pub steps_per_epoch:   Option<usize>,
    pub validation_steps:  Option<usize>,
    pub seed:              u64,
    pub num_workers:       usize,
    pub trainable_encoder: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            train_csv:         "data/jigsaw-toxic-comment-train-processed-seqlen128.csv".into(),
            validation_csv:    "data/validation-processed-seqlen128.csv".into(),
            test_csv:          "data/test-processed-seqlen128.csv".into(),
            checkpoint_dir:    "checkpoints".into(),
            submission_path:   "submission.csv".into(),
            pretrained_dir:    None,
            model_id:          DEFAULT_MODEL_ID.to_string(),
            cache_dir:         None,
            random_init:       false,
            seq_len:           DEFAULT_SEQ_LEN,
            label_column:      DEFAULT_LABEL_COLUMN.to_string(),
            languages:         VALIDATION_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            batch_size:        64,
            epochs:            1,
            lr:                1e-5,
            steps_per_epoch:   None,
            validation_steps:  None,
            seed:              42,
            num_workers:       1,
            trainable_encoder: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            epochs:            self.epochs,
            batch_size:        self.batch_size,
            learning_rate:     self.lr,
            steps_per_epoch:   self.steps_per_epoch,
            validation_steps:  self.validation_steps,
            seed:              self.seed,
            num_workers:       self.num_workers,
            trainable_encoder: self.trainable_encoder,
        }
    }

    fn labelled_source(&self, path: &Path) -> CsvExampleSource {
        CsvExampleSource::labelled(path)
            .with_seq_len(self.seq_len)
            .with_label_column(self.label_column.clone())
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    pub before_training: Vec<EvalReport>,
    pub epochs:          Vec<EpochSummary>,
    pub after_training:  Vec<EvalReport>,
    pub predictions:     usize,
    pub metrics_csv:     PathBuf,
}

// ─── BenchmarkUseCase ─────────────────────────────────────────────────────────
pub struct BenchmarkUseCase {
    config: BenchmarkConfig,
}

impl BenchmarkUseCase {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Run the benchmark on the GPU backend.
    pub fn execute(&self) -> Result<BenchmarkOutcome> {
        let device = Default::default();
        self.run::<TrainBackend>(&device)
    }

    /// Run the benchmark on any autodiff backend.
    pub fn run<B: AutodiffBackend>(&self, device: &B::Device) -> Result<BenchmarkOutcome> {
        let cfg = &self.config;

        // ── Step 1: Load the three processed CSV files ────────────────────────
        let train_data = ToxicDataset::new(cfg.labelled_source(&cfg.train_csv).load_all()?);
        let validation = ToxicDataset::new(cfg.labelled_source(&cfg.validation_csv).load_all()?);
        let test = CsvExampleSource::unlabelled(&cfg.test_csv)
            .with_seq_len(cfg.seq_len)
            .load_all()?;
        let test_ids = example_ids(&test)?;

        if train_data.examples().is_empty() {
            bail!("Training file '{}' has no rows", cfg.train_csv.display());
        }
        tracing::info!(
            "Data: {} train ({:.1}% toxic), {} validation, {} test",
            train_data.examples().len(),
            train_data.positive_rate().unwrap_or(0.0) * 100.0,
            validation.examples().len(),
            test.len()
        );

        // ── Steps 2 + 3: Build the classifier around the pretrained encoder ───
        let (model_cfg, model) = self.build_model::<B>(device)?;

        // ── Step 4: Save configs so evaluate / predict can rebuild it ─────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_model_config(&model_cfg)?;
        ckpt_manager.save_run_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        let filters = LanguageFilter::evaluation_set(&cfg.languages);

        // ── Step 5: Zero-shot baseline with an untrained head ─────────────────
        println!("\nBefore training");
        let before_training = evaluate_languages(
            &model.valid(),
            &validation,
            &filters,
            cfg.batch_size,
            "before_training",
            Some(&metrics),
        )?;

        // ── Step 6: Fine-tune on the English training set ─────────────────────
        let (model, epochs) = train(
            model,
            train_data,
            &validation,
            &cfg.training_options(),
            &ckpt_manager,
            Some(&metrics),
        )?;
        let model = model.valid();

        // ── Step 7: Evaluate the fine-tuned model ─────────────────────────────
        println!("\nAfter training");
        let after_training = evaluate_languages(
            &model,
            &validation,
            &filters,
            cfg.batch_size,
            "after_training",
            Some(&metrics),
        )?;

        // ── Step 8: Score the test set and write the submission ───────────────
        let probabilities = Predictor::new(model, cfg.batch_size).score(&test)?;
        write_submission_file(&cfg.submission_path, &test_ids, &probabilities)?;

        Ok(BenchmarkOutcome {
            before_training,
            epochs,
            after_training,
            predictions: probabilities.len(),
            metrics_csv: metrics.csv_path().to_path_buf(),
        })
    }

    fn build_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(ToxicClassifierConfig, ToxicClassifier<B>)> {
        let cfg = &self.config;

        let files = match &cfg.pretrained_dir {
            Some(dir) => PretrainedFiles::from_dir(dir)?,
            None      => PretrainedFiles::fetch(&cfg.model_id, cfg.cache_dir.as_deref())?,
        };
        let bert_cfg: BertConfig = files.load_config()?;
        if cfg.seq_len > bert_cfg.max_position_embeddings {
            bail!(
                "seq_len {} exceeds the encoder's {} position embeddings",
                cfg.seq_len,
                bert_cfg.max_position_embeddings
            );
        }

        let model_cfg = ToxicClassifierConfig::new(bert_cfg);
        let mut model = model_cfg.init::<B>(device);

        if cfg.random_init {
            tracing::warn!("Skipping pretrained weights, the encoder starts from random values");
        } else {
            model.bert = files.load_into(model.bert, device)?;
        }

        tracing::info!(
            "Classifier: {} layers, hidden {}, head {}",
            model_cfg.bert.num_hidden_layers,
            model_cfg.bert.hidden_size,
            model_cfg.head_hidden
        );
        Ok((model_cfg, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type TestBackend = Autodiff<NdArray>;

    const HEADER: &str = "id,comment_text,input_word_ids,input_mask,all_segment_id,toxic,lang";

    fn row(id: usize, token: u32, toxic: u8, lang: &str) -> String {
        format!("{id},text,\"(1, {token}, 2, 0)\",\"(1, 1, 1, 0)\",\"(0, 0, 0, 0)\",{toxic},{lang}")
    }

    /// Writes a tiny pre-tokenized benchmark (seq_len 4) and config.json.
    fn fixture(dir: &Path) -> BenchmarkConfig {
        let train: Vec<String> = (0..6).map(|i| row(i, 3 + i as u32, (i % 2) as u8, "en")).collect();
        let valid = [
            row(0, 4, 1, "es"),
            row(1, 5, 0, "es"),
            row(2, 6, 1, "it"),
            row(3, 7, 0, "it"),
            row(4, 8, 0, "tr"),
        ];
        fs::write(dir.join("train.csv"), format!("{HEADER}\n{}\n", train.join("\n"))).unwrap();
        fs::write(dir.join("valid.csv"), format!("{HEADER}\n{}\n", valid.join("\n"))).unwrap();
        fs::write(
            dir.join("test.csv"),
            "id,content,input_word_ids,input_mask,all_segment_id,lang\n\
             7,hola,\"(1, 9, 2, 0)\",\"(1, 1, 1, 0)\",\"(0, 0, 0, 0)\",es\n\
             3,ciao,\"(1, 10, 2, 0)\",\"(1, 1, 1, 0)\",\"(0, 0, 0, 0)\",it\n",
        )
        .unwrap();

        let model_dir = dir.join("model");
        fs::create_dir_all(&model_dir).unwrap();
        fs::write(
            model_dir.join("config.json"),
            r#"{"vocab_size": 16, "hidden_size": 8, "num_hidden_layers": 1,
                "num_attention_heads": 2, "intermediate_size": 16,
                "max_position_embeddings": 4, "type_vocab_size": 2}"#,
        )
        .unwrap();
        fs::write(model_dir.join("model.safetensors"), b"").unwrap();

        BenchmarkConfig {
            train_csv:       dir.join("train.csv"),
            validation_csv:  dir.join("valid.csv"),
            test_csv:        dir.join("test.csv"),
            checkpoint_dir:  dir.join("checkpoints"),
            submission_path: dir.join("out").join("submission.csv"),
            pretrained_dir:  Some(model_dir),
            random_init:     true,
            seq_len:         4,
            batch_size:      2,
            lr:              1e-3,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_run_writes_submission_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture(dir.path());

        let outcome = BenchmarkUseCase::new(cfg.clone())
            .run::<TestBackend>(&Default::default())
            .unwrap();

        let languages: Vec<&str> =
            outcome.before_training.iter().map(|r| r.language.as_str()).collect();
        assert_eq!(languages, vec!["Combined", "es", "it", "tr"]);
        assert_eq!(outcome.after_training.len(), 4);
        assert_eq!(outcome.epochs.len(), 1);
        assert_eq!(outcome.predictions, 2);
        assert_eq!(outcome.epochs[0].steps, 3);
        assert_eq!(outcome.metrics_csv, cfg.checkpoint_dir.join("metrics.csv"));

        let submission = fs::read_to_string(&cfg.submission_path).unwrap();
        let lines: Vec<&str> = submission.lines().collect();
        assert_eq!(lines[0], "id,toxic");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("7,"));
        assert!(lines[2].starts_with("3,"));
        for line in &lines[1..] {
            let p: f32 = line.split(',').nth(1).unwrap().parse().unwrap();
            assert!((0.0..=1.0).contains(&p));
        }

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 1);
        assert_eq!(ckpt.load_run_config().unwrap().seq_len, 4);

        // header + 4 before + 1 epoch + 4 after
        let metrics = fs::read_to_string(cfg.checkpoint_dir.join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 10);
    }

    #[test]
    fn test_seq_len_longer_than_positions_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture(dir.path());
        fs::write(
            dir.path().join("model").join("config.json"),
            r#"{"vocab_size": 16, "hidden_size": 8, "num_hidden_layers": 1,
                "num_attention_heads": 2, "intermediate_size": 16,
                "max_position_embeddings": 2}"#,
        )
        .unwrap();
        let err = BenchmarkUseCase::new(cfg).run::<TestBackend>(&Default::default()).unwrap_err();
        assert!(err.to_string().contains("position embeddings"), "{err}");
    }
}
