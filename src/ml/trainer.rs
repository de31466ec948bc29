// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fine-tunes the classifier on English comments with Adam and
// binary cross-entropy, validating on the multilingual set after
// every epoch.
//
//   - Training runs on an AutodiffBackend (Autodiff<Wgpu> in the CLI)
//   - model.valid() gives the same weights on the inner backend,
//     where dropout is disabled, for validation
//   - steps_per_epoch / validation_steps cap the work per epoch
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{batcher::{ToxicBatch, ToxicBatcher}, dataset::ToxicDataset};
use crate::domain::language::LanguageFilter;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::evaluator::{evaluate, Evaluation};
use crate::ml::model::{binary_cross_entropy_with_logits, ToxicClassifier};
use crate::ml::predictor::model_device;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs:            usize,
    pub batch_size:        usize,
    pub learning_rate:     f64,
    /// Stop an epoch after this many optimiser steps
    pub steps_per_epoch:   Option<usize>,
    /// Validate on at most this many batches per epoch
    pub validation_steps:  Option<usize>,
    pub seed:              u64,
    pub num_workers:       usize,
    /// When false only the classification head is updated
    pub trainable_encoder: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs:            1,
            batch_size:        64,
            learning_rate:     1e-5,
            steps_per_epoch:   None,
            validation_steps:  None,
            seed:              42,
            num_workers:       1,
            trainable_encoder: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpochSummary {
    pub epoch:      usize,
    pub steps:      usize,
    pub train_loss: f64,
    pub validation: Option<Evaluation>,
}

/// Shuffled batches built on `device`.
pub fn training_loader<B: Backend>(
    train_data: ToxicDataset,
    opts:       &TrainingOptions,
    device:     B::Device,
) -> Arc<dyn DataLoader<B, ToxicBatch<B>>> {
    DataLoaderBuilder::new(ToxicBatcher::new())
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(opts.num_workers)
        .set_device(device)
        .build(train_data)
}

/// Train `model` and return the fine-tuned weights with one summary
/// per epoch. A checkpoint is written after every epoch.
pub fn train<B: AutodiffBackend>(
    model:        ToxicClassifier<B>,
    train_data:   ToxicDataset,
    validation:   &ToxicDataset,
    opts:         &TrainingOptions,
    ckpt_manager: &CheckpointManager,
    metrics:      Option<&MetricsLogger>,
) -> Result<(ToxicClassifier<B>, Vec<EpochSummary>)> {
    let mut model = if opts.trainable_encoder {
        model
    } else {
        tracing::info!("Encoder frozen, training the classification head only");
        model.freeze_encoder()
    };

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    // ── Shuffled training loader on the model's device ────────────────────────
    let train_loader = training_loader::<B>(train_data, opts, model_device::<B, _>(&model));

    // ── Validation subset ─────────────────────────────────────────────────────
    let validation_examples = match opts.validation_steps {
        Some(steps) => {
            let n = (steps * opts.batch_size).min(validation.examples().len());
            &validation.examples()[..n]
        }
        None => validation.examples(),
    };

    let mut summaries = Vec::with_capacity(opts.epochs);

    for epoch in 1..=opts.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut steps    = 0usize;

        for batch in train_loader.iter() {
            if opts.steps_per_epoch.is_some_and(|max| steps >= max) {
                break;
            }

            let logits = model.forward(batch.input_word_ids, batch.input_mask, batch.segment_ids);
            let loss = binary_cross_entropy_with_logits(logits, batch.labels);

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            steps    += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(opts.learning_rate, model, grads);

            if steps % 100 == 0 {
                tracing::debug!("epoch {} step {} loss={:.4}", epoch, steps, loss_sum / steps as f64);
            }
        }

        let train_loss = if steps > 0 { loss_sum / steps as f64 } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let validation_result = if validation_examples.is_empty() {
            None
        } else {
            let model_valid = model.valid();
            Some(evaluate(&model_valid, validation_examples, opts.batch_size)?)
        };

        match &validation_result {
            Some(v) => println!(
                "Epoch {:>3}/{} | steps={} | train_loss={:.4} | val_loss={:.4} | val_auc={} | val_acc={:.1}%",
                epoch, opts.epochs, steps, train_loss, v.loss,
                v.auc.map(|a| format!("{a:.4}")).unwrap_or_else(|| "n/a".into()),
                v.accuracy * 100.0,
            ),
            None => println!(
                "Epoch {:>3}/{} | steps={} | train_loss={:.4}",
                epoch, opts.epochs, steps, train_loss,
            ),
        }

        if let (Some(logger), Some(v)) = (metrics, &validation_result) {
            logger.log(&v.clone().into_report(&format!("epoch_{epoch}"), &LanguageFilter::Combined))?;
        }

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        summaries.push(EpochSummary { epoch, steps, train_loss, validation: validation_result });
    }

    tracing::info!("Training complete!");
    Ok((model, summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::EncodedExample;
    use crate::ml::bert::BertConfig;
    use crate::ml::model::ToxicClassifierConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn example(token: u32, label: f32) -> EncodedExample {
        EncodedExample {
            id:             None,
            label:          Some(label),
            lang:           Some("es".into()),
            input_word_ids: vec![1, token, 2, 0],
            input_mask:     vec![1, 1, 1, 0],
            segment_ids:    vec![0; 4],
        }
    }

    fn dataset() -> ToxicDataset {
        ToxicDataset::new((0..8).map(|i| example(3 + i, (i % 2) as f32)).collect())
    }

    fn tiny_model() -> ToxicClassifier<TestBackend> {
        ToxicClassifierConfig::new(BertConfig::new(16, 8, 1, 2, 16, 4, 2))
            .init::<TestBackend>(&Default::default())
    }

    fn options() -> TrainingOptions {
        TrainingOptions { epochs: 2, batch_size: 2, learning_rate: 1e-3, ..Default::default() }
    }

    #[test]
    fn test_loader_builds_batches_on_the_model_device() {
        let model = tiny_model();
        let device = model_device::<TestBackend, _>(&model);
        let loader = training_loader::<TestBackend>(dataset(), &options(), device.clone());

        let batches: Vec<ToxicBatch<TestBackend>> = loader.iter().collect();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.labels.device() == device));
        assert!(batches.iter().all(|b| b.input_word_ids.device() == device));
    }

    #[test]
    fn test_trains_every_epoch_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let (_, summaries) = train(tiny_model(), dataset(), &dataset(), &options(), &ckpt, None).unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.steps == 4 && s.train_loss.is_finite()));
        assert!(summaries.iter().all(|s| s.validation.as_ref().map(|v| v.examples) == Some(8)));
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
    }

    #[test]
    fn test_step_caps_are_respected() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let opts = TrainingOptions {
            epochs: 1,
            steps_per_epoch: Some(1),
            validation_steps: Some(1),
            ..options()
        };

        let (_, summaries) = train(tiny_model(), dataset(), &dataset(), &opts, &ckpt, None).unwrap();
        assert_eq!(summaries[0].steps, 1);
        assert_eq!(summaries[0].validation.as_ref().unwrap().examples, 2);
    }

    #[test]
    fn test_frozen_encoder_keeps_pretrained_weights() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let model = tiny_model();
        let before: Vec<f32> = model.bert.pooler.weight.val().into_data().to_vec().unwrap();
        let head_before: Vec<f32> = model.output.bias.as_ref().unwrap().val().into_data().to_vec().unwrap();

        let opts = TrainingOptions { epochs: 1, trainable_encoder: false, ..options() };
        let (trained, _) = train(model, dataset(), &ToxicDataset::default(), &opts, &ckpt, None).unwrap();

        let after: Vec<f32> = trained.bert.pooler.weight.val().into_data().to_vec().unwrap();
        let head_after: Vec<f32> = trained.output.bias.as_ref().unwrap().val().into_data().to_vec().unwrap();
        assert_eq!(before, after);
        assert_ne!(head_before, head_after);
    }
}
