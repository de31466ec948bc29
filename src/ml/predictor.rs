// ============================================================
// Layer 5 — Predictor
// ============================================================
// Order-preserving batched inference: examples are chunked in
// input order (no shuffling, no worker threads) so the i-th
// probability always belongs to the i-th example.

use anyhow::{anyhow, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batcher::{ToxicBatch, ToxicBatcher};
use crate::domain::example::EncodedExample;
use crate::domain::traits::ToxicityScorer;
use crate::ml::model::ToxicClassifier;

/// Device holding the module's parameters.
pub fn model_device<B: Backend, M: Module<B>>(model: &M) -> B::Device {
    model.devices().into_iter().next().unwrap_or_default()
}

/// Sigmoid probabilities for `examples`, in order.
pub fn predict_probabilities<B: Backend>(
    model:      &ToxicClassifier<B>,
    examples:   &[EncodedExample],
    batch_size: usize,
) -> Result<Vec<f32>> {
    let device  = model_device::<B, _>(model);
    let batcher = ToxicBatcher::new();
    let mut probabilities = Vec::with_capacity(examples.len());

    for chunk in examples.chunks(batch_size.max(1)) {
        let batch: ToxicBatch<B> = batcher.batch(chunk.to_vec(), &device);
        let probs = model.forward_probabilities(
            batch.input_word_ids,
            batch.input_mask,
            batch.segment_ids,
        );
        let values = probs
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read predictions back from device: {e:?}"))?;
        probabilities.extend(values);
    }

    tracing::debug!("Scored {} examples", probabilities.len());
    Ok(probabilities)
}

/// A trained classifier ready to score test data.
pub struct Predictor<B: Backend> {
    model:      ToxicClassifier<B>,
    batch_size: usize,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: ToxicClassifier<B>, batch_size: usize) -> Self {
        Self { model, batch_size }
    }
}

impl<B: Backend> ToxicityScorer for Predictor<B> {
    fn score(&self, examples: &[EncodedExample]) -> Result<Vec<f32>> {
        predict_probabilities(&self.model, examples, self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::bert::BertConfig;
    use crate::ml::model::ToxicClassifierConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn example(first_token: u32) -> EncodedExample {
        EncodedExample {
            id:             Some(first_token.to_string()),
            label:          None,
            lang:           None,
            input_word_ids: vec![1, first_token, 2, 0],
            input_mask:     vec![1, 1, 1, 0],
            segment_ids:    vec![0; 4],
        }
    }

    #[test]
    fn test_batching_does_not_change_results() {
        let model = ToxicClassifierConfig::new(BertConfig::new(16, 8, 1, 2, 16, 4, 2))
            .init::<TestBackend>(&Default::default());
        let examples: Vec<EncodedExample> = (3..10).map(example).collect();

        let one_by_one = predict_probabilities(&model, &examples, 1).unwrap();
        let batched = Predictor::new(model, 3).score(&examples).unwrap();

        assert_eq!(batched.len(), examples.len());
        for (a, b) in one_by_one.iter().zip(&batched) {
            assert!((a - b).abs() < 1e-5);
            assert!((0.0..=1.0).contains(b));
        }
    }

    #[test]
    fn test_empty_input_gives_no_predictions() {
        let model = ToxicClassifierConfig::new(BertConfig::new(16, 8, 1, 2, 16, 4, 2))
            .init::<TestBackend>(&Default::default());
        assert!(predict_probabilities(&model, &[], 4).unwrap().is_empty());
    }
}
