// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the fine-tuned classifier with Burn's
// CompactRecorder.
//
// File layout:
//   checkpoints/
//     model_epoch_1.mpk     ← weights after epoch 1
//     ...
//     latest_epoch.json     ← number of the latest epoch
//     model_config.json     ← ToxicClassifierConfig (architecture)
//     run_config.json       ← BenchmarkConfig (paths + hyperparameters)
//
// The architecture config is needed to rebuild an identically shaped
// model before the recorded weights can be loaded into it.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::benchmark_use_case::BenchmarkConfig;
use crate::ml::model::{ToxicClassifier, ToxicClassifierConfig};

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const RUN_CONFIG_FILE:   &str = "run_config.json";

/// Manages saving and loading of model checkpoints in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Record weights to `{dir}/model_epoch_{epoch}` and move the
    /// latest-epoch pointer.
    pub fn save_model<B: Backend>(
        &self,
        model: &ToxicClassifier<B>,
        epoch: usize,
    ) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        self.write_json(LATEST_EPOCH_FILE, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest recorded weights into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  ToxicClassifier<B>,
        device: &B::Device,
    ) -> Result<ToxicClassifier<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you run 'benchmark' first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Rebuild the saved architecture and load the latest weights.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<ToxicClassifier<B>> {
        let model_cfg = self.load_model_config()?;
        let model = model_cfg.init::<B>(device);
        self.load_model(model, device)
    }

    pub fn save_model_config(&self, cfg: &ToxicClassifierConfig) -> Result<()> {
        self.write_json(MODEL_CONFIG_FILE, cfg)
    }

    pub fn load_model_config(&self) -> Result<ToxicClassifierConfig> {
        self.read_json(MODEL_CONFIG_FILE)
    }

    pub fn save_run_config(&self, cfg: &BenchmarkConfig) -> Result<()> {
        self.write_json(RUN_CONFIG_FILE, cfg)
    }

    pub fn load_run_config(&self) -> Result<BenchmarkConfig> {
        self.read_json(RUN_CONFIG_FILE)
    }

    /// Returns an error if training hasn't produced a checkpoint yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read '{}'. Make sure you have run 'benchmark' first.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}
