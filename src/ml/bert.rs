// ============================================================
// Layer 5 — BERT Encoder
// ============================================================
// The pretrained multilingual representation model, expressed
// with Burn building blocks so Hugging Face weights can be
// loaded into it (see infra::pretrained).
//
//   word + position + token_type embeddings
//       → LayerNorm → dropout
//       → N × [ self-attention → add & norm → GELU FFN → add & norm ]
//       → pooler: tanh(dense(h[CLS]))
//
// Padding positions are excluded from attention through Burn's
// MultiHeadAttention pad mask, which fills their scores with -1e4
// before the softmax.
//
// Reference: Devlin et al. (2019) BERT

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::gelu,
};
use serde::Deserialize;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct BertConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    pub type_vocab_size:         usize,
    #[config(default = 0.1)]
    pub hidden_dropout:          f64,
    #[config(default = 0.1)]
    pub attention_dropout:       f64,
    #[config(default = 1e-12)]
    pub layer_norm_eps:          f64,
}

/// The subset of a Hugging Face `config.json` we read.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HfBertConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size:         usize,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob:     f64,
    #[serde(default = "default_dropout")]
    pub attention_probs_dropout_prob: f64,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps:          f64,
}

fn default_type_vocab_size() -> usize { 2 }
fn default_dropout() -> f64 { 0.1 }
fn default_layer_norm_eps() -> f64 { 1e-12 }

impl From<HfBertConfig> for BertConfig {
    fn from(hf: HfBertConfig) -> Self {
        BertConfig::new(
            hf.vocab_size,
            hf.hidden_size,
            hf.num_hidden_layers,
            hf.num_attention_heads,
            hf.intermediate_size,
            hf.max_position_embeddings,
            hf.type_vocab_size,
        )
        .with_hidden_dropout(hf.hidden_dropout_prob)
        .with_attention_dropout(hf.attention_probs_dropout_prob)
        .with_layer_norm_eps(hf.layer_norm_eps)
    }
}

impl BertConfig {
    pub fn from_hf_json(json: &str) -> anyhow::Result<Self> {
        let hf: HfBertConfig = serde_json::from_str(json)?;
        Ok(hf.into())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> BertModel<B> {
        assert!(
            self.hidden_size % self.num_attention_heads == 0,
            "hidden_size ({}) must be divisible by num_attention_heads ({})",
            self.hidden_size,
            self.num_attention_heads
        );

        let embeddings = BertEmbeddings {
            word_embeddings:       EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position_embeddings:   EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device),
            token_type_embeddings: EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device),
            norm:    self.layer_norm(device),
            dropout: DropoutConfig::new(self.hidden_dropout).init(),
        };

        let layers = (0..self.num_hidden_layers)
            .map(|_| self.build_layer(device))
            .collect();

        let pooler = LinearConfig::new(self.hidden_size, self.hidden_size).init(device);

        BertModel { embeddings, layers, pooler }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }

    fn build_layer<B: Backend>(&self, device: &B::Device) -> BertLayer<B> {
        let h = self.hidden_size;
        BertLayer {
            attention: MultiHeadAttentionConfig::new(h, self.num_attention_heads)
                .with_dropout(self.attention_dropout)
                .init(device),
            attention_norm: self.layer_norm(device),
            intermediate:   LinearConfig::new(h, self.intermediate_size).init(device),
            output:         LinearConfig::new(self.intermediate_size, h).init(device),
            output_norm:    self.layer_norm(device),
            dropout:        DropoutConfig::new(self.hidden_dropout).init(),
        }
    }
}

// ─── Embeddings ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertEmbeddings<B: Backend> {
    pub word_embeddings:       Embedding<B>,
    pub position_embeddings:   Embedding<B>,
    pub token_type_embeddings: Embedding<B>,
    pub norm:                  LayerNorm<B>,
    pub dropout:               Dropout,
}

impl<B: Backend> BertEmbeddings<B> {
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        token_type_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);

        let x = self.word_embeddings.forward(input_ids)
            + self.position_embeddings.forward(positions)
            + self.token_type_embeddings.forward(token_type_ids);

        self.dropout.forward(self.norm.forward(x))
    }
}

// ─── Encoder layer ────────────────────────────────────────────────────────────
// `attention.output` is BERT's attention.output.dense projection.
#[derive(Module, Debug)]
pub struct BertLayer<B: Backend> {
    pub attention:      MultiHeadAttention<B>,
    pub attention_norm: LayerNorm<B>,
    pub intermediate:   Linear<B>,
    pub output:         Linear<B>,
    pub output_norm:    LayerNorm<B>,
    pub dropout:        Dropout,
}

impl<B: Backend> BertLayer<B> {
    /// x: [batch, seq, hidden], pad_mask: [batch, seq] (true = padding)
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn = self.attention.forward(input).context;
        let x = self.attention_norm.forward(x + self.dropout.forward(attn));

        let ffn = self.output.forward(gelu(self.intermediate.forward(x.clone())));
        self.output_norm.forward(x + self.dropout.forward(ffn))
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertModel<B: Backend> {
    pub embeddings: BertEmbeddings<B>,
    pub layers:     Vec<BertLayer<B>>,
    pub pooler:     Linear<B>,
}

impl<B: Backend> BertModel<B> {
    /// Pooled [CLS] representation: [batch, hidden]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        token_type_ids: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let batch_size = input_ids.dims()[0];

        let pad_mask = padding_mask(attention_mask);

        let mut x = self.embeddings.forward(input_ids, token_type_ids);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }

        let hidden = x.dims()[2];
        let cls = x
            .slice([0..batch_size, 0..1, 0..hidden])
            .reshape([batch_size, hidden]);
        self.pooler.forward(cls).tanh()
    }
}

/// 0/1 attention mask → pad mask where `true` marks padding.
pub fn padding_mask<B: Backend>(attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2, Bool> {
    attention_mask.equal_elem(0)
}
