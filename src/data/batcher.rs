// ============================================================
// Layer 4 — Toxicity Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<EncodedExample>
// into tensors for the classifier:
//
//   Input:  N examples, each with three sequences of length S
//   Output: ToxicBatch with [N, S] Int tensors and [N] labels
//
// All sequences are already padded to the same length by the
// upstream tokenisation, so no dynamic padding happens here.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::example::EncodedExample;

/// A batch of encoded comments ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ToxicBatch<B: Backend> {
    /// [batch_size, seq_len]
    pub input_word_ids: Tensor<B, 2, Int>,

    /// [batch_size, seq_len]: 1 = real token, 0 = padding
    pub input_mask: Tensor<B, 2, Int>,

    /// [batch_size, seq_len]
    pub segment_ids: Tensor<B, 2, Int>,

    /// [batch_size]: 0.0 for unlabeled examples
    pub labels: Tensor<B, 1>,
}

/// Stateless batcher; the data loader supplies the target device.
#[derive(Clone, Debug, Default)]
pub struct ToxicBatcher;

impl ToxicBatcher {
    pub fn new() -> Self {
        Self
    }
}

fn stack<B: Backend>(
    rows:    Vec<&[u32]>,
    seq_len: usize,
    device:  &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();
    let flat: Vec<i32> = rows
        .into_iter()
        .flat_map(|row| row.iter().map(|&x| x as i32))
        .collect();
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([batch_size, seq_len])
}

impl<B: Backend> Batcher<B, EncodedExample, ToxicBatch<B>> for ToxicBatcher {
    fn batch(&self, items: Vec<EncodedExample>, device: &B::Device) -> ToxicBatch<B> {
        let seq_len = items.first().map(|e| e.seq_len()).unwrap_or(0);

        let input_word_ids = stack::<B>(
            items.iter().map(|e| e.input_word_ids.as_slice()).collect(),
            seq_len,
            device,
        );
        let input_mask = stack::<B>(
            items.iter().map(|e| e.input_mask.as_slice()).collect(),
            seq_len,
            device,
        );
        let segment_ids = stack::<B>(
            items.iter().map(|e| e.segment_ids.as_slice()).collect(),
            seq_len,
            device,
        );

        let labels: Vec<f32> = items.iter().map(|e| e.label.unwrap_or(0.0)).collect();
        let labels = Tensor::<B, 1>::from_floats(labels.as_slice(), device);

        ToxicBatch { input_word_ids, input_mask, segment_ids, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn example(ids: [u32; 3], label: Option<f32>) -> EncodedExample {
        EncodedExample {
            id:             None,
            label,
            lang:           None,
            input_word_ids: ids.to_vec(),
            input_mask:     vec![1, 1, 0],
            segment_ids:    vec![0, 0, 0],
        }
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batch: ToxicBatch<TestBackend> = ToxicBatcher::new().batch(
            vec![example([101, 5, 0], Some(1.0)), example([101, 6, 0], None)],
            &device,
        );
        assert_eq!(batch.input_word_ids.dims(), [2, 3]);
        assert_eq!(batch.input_mask.dims(), [2, 3]);
        assert_eq!(batch.segment_ids.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2]);
    }

    #[test]
    fn test_rows_keep_their_order() {
        let device = Default::default();
        let batch: ToxicBatch<TestBackend> = ToxicBatcher::new().batch(
            vec![example([101, 5, 0], Some(1.0)), example([101, 6, 0], None)],
            &device,
        );
        let ids: Vec<i64> = batch
            .input_word_ids
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap();
        assert_eq!(ids, vec![101, 5, 0, 101, 6, 0]);

        let labels: Vec<f32> = batch.labels.into_data().to_vec().unwrap();
        assert_eq!(labels, vec![1.0, 0.0]);
    }
}
