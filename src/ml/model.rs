use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::ml::bert::{BertConfig, BertModel};

#[derive(Config, Debug)]
pub struct ToxicClassifierConfig {
    pub bert: BertConfig,
    /// Width of the dense layer on top of the pooled output
    #[config(default = 32)]
    pub head_hidden: usize,
}

impl ToxicClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ToxicClassifier<B> {
        let hidden = self.bert.hidden_size;
        ToxicClassifier {
            bert:   self.bert.init(device),
            dense:  LinearConfig::new(hidden, self.head_hidden).init(device),
            output: LinearConfig::new(self.head_hidden, 1).init(device),
        }
    }
}

/// BERT → pooled [CLS] → Dense(32, ReLU) → Dense(1).
#[derive(Module, Debug)]
pub struct ToxicClassifier<B: Backend> {
    pub bert:   BertModel<B>,
    pub dense:  Linear<B>,
    pub output: Linear<B>,
}

impl<B: Backend> ToxicClassifier<B> {
    /// Returns one logit per example: [batch]
    pub fn forward(
        &self,
        input_word_ids: Tensor<B, 2, Int>,
        input_mask:     Tensor<B, 2, Int>,
        segment_ids:    Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let batch_size = input_word_ids.dims()[0];
        let pooled = self.bert.forward(input_word_ids, input_mask, segment_ids);
        let hidden = relu(self.dense.forward(pooled));
        self.output.forward(hidden).reshape([batch_size])
    }

    pub fn forward_probabilities(
        &self,
        input_word_ids: Tensor<B, 2, Int>,
        input_mask:     Tensor<B, 2, Int>,
        segment_ids:    Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        sigmoid(self.forward(input_word_ids, input_mask, segment_ids))
    }

    /// Stop gradients from flowing into the encoder.
    pub fn freeze_encoder(mut self) -> Self {
        self.bert = self.bert.no_grad();
        self
    }
}

/// Mean binary cross-entropy computed from logits:
///   max(z, 0) - z·y + ln(1 + e^{-|z|})
/// which never evaluates exp() of a large positive number.
pub fn binary_cross_entropy_with_logits<B: Backend>(
    logits: Tensor<B, 1>,
    labels: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let positive_part = logits.clone().clamp_min(0.0);
    let log_term = logits.clone().abs().neg().exp().log1p();
    (positive_part - logits * labels + log_term).mean()
}
