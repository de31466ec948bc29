// ============================================================
// Layer 6 — Pretrained Weights
// ============================================================
// Locates the pretrained multilingual BERT files (config.json,
// model.safetensors, tokenizer.json) either in a local directory
// or on the Hugging Face Hub, and copies the checkpoint tensors
// into a freshly initialised `BertModel`.
//
// Tensor naming follows the Hugging Face BERT layout:
//
//   bert.embeddings.word_embeddings.weight
//   bert.encoder.layer.{i}.attention.self.query.weight
//   bert.encoder.layer.{i}.attention.output.LayerNorm.weight
//   bert.pooler.dense.weight
//
// Some checkpoints omit the "bert." prefix and older ones call the
// LayerNorm parameters gamma / beta; both spellings are accepted.
// PyTorch stores Linear weights as [out, in] while Burn uses
// [in, out], so those are transposed on the way in.

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    module::Param,
    nn::{Embedding, LayerNorm, Linear},
    prelude::*,
};
use hf_hub::api::sync::{Api, ApiBuilder};
use safetensors::{
    tensor::{Dtype, TensorView},
    SafeTensors,
};
use std::path::{Path, PathBuf};

use crate::ml::bert::{BertConfig, BertModel};

pub const DEFAULT_MODEL_ID: &str = "bert-base-multilingual-cased";

/// Local paths to the pretrained model files.
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    pub config:  PathBuf,
    pub weights: PathBuf,
}

fn hub_api(cache_dir: Option<&Path>) -> Result<Api> {
    let builder = match cache_dir {
        Some(dir) => ApiBuilder::new().with_cache_dir(dir.to_path_buf()),
        None => ApiBuilder::new(),
    };
    builder.build().context("Cannot initialise Hugging Face Hub client")
}

impl PretrainedFiles {
    /// Use files already on disk: `{dir}/config.json`, `{dir}/model.safetensors`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config = dir.join("config.json");
        let weights = dir.join("model.safetensors");
        for path in [&config, &weights] {
            if !path.exists() {
                bail!("Pretrained file '{}' not found", path.display());
            }
        }
        Ok(Self { config, weights })
    }

    /// Download (or reuse from the hub cache) the files for `model_id`.
    pub fn fetch(model_id: &str, cache_dir: Option<&Path>) -> Result<Self> {
        let repo = hub_api(cache_dir)?.model(model_id.to_string());

        tracing::info!("Fetching pretrained model '{}'", model_id);
        let config = repo
            .get("config.json")
            .with_context(|| format!("Cannot fetch config.json for '{model_id}'"))?;
        let weights = repo
            .get("model.safetensors")
            .with_context(|| format!("Cannot fetch model.safetensors for '{model_id}'"))?;

        Ok(Self { config, weights })
    }

    /// Only `tokenizer.json`, for encoding raw text without the weights.
    pub fn fetch_tokenizer(model_id: &str, cache_dir: Option<&Path>) -> Result<PathBuf> {
        hub_api(cache_dir)?
            .model(model_id.to_string())
            .get("tokenizer.json")
            .with_context(|| format!("Cannot fetch tokenizer.json for '{model_id}'"))
    }

    pub fn load_config(&self) -> Result<BertConfig> {
        let json = std::fs::read_to_string(&self.config)
            .with_context(|| format!("Cannot read '{}'", self.config.display()))?;
        BertConfig::from_hf_json(&json)
            .with_context(|| format!("Unexpected BERT config in '{}'", self.config.display()))
    }

    /// Read the safetensors file and copy it into `model`.
    pub fn load_into<B: Backend>(&self, model: BertModel<B>, device: &B::Device) -> Result<BertModel<B>> {
        let bytes = std::fs::read(&self.weights)
            .with_context(|| format!("Cannot read '{}'", self.weights.display()))?;
        let tensors = SafeTensors::deserialize(&bytes)
            .map_err(|e| anyhow!("Cannot parse '{}': {e}", self.weights.display()))?;
        let model = WeightLoader::new(&tensors, device).load_bert(model)?;
        tracing::info!(
            "Loaded {} pretrained tensors from '{}'",
            tensors.names().len(),
            self.weights.display()
        );
        Ok(model)
    }
}

/// Looks tensors up by name and converts them to Burn tensors.
pub struct WeightLoader<'a, B: Backend> {
    tensors: &'a SafeTensors<'a>,
    prefix:  &'static str,
    device:  &'a B::Device,
}

impl<'a, B: Backend> WeightLoader<'a, B> {
    pub fn new(tensors: &'a SafeTensors<'a>, device: &'a B::Device) -> Self {
        let prefixed = tensors
            .names()
            .iter()
            .any(|n| n.starts_with("bert."));
        Self {
            tensors,
            prefix: if prefixed { "bert." } else { "" },
            device,
        }
    }

    pub fn load_bert(&self, mut model: BertModel<B>) -> Result<BertModel<B>> {
        let emb = &mut model.embeddings;
        emb.word_embeddings       = self.embedding(emb.word_embeddings.clone(), "embeddings.word_embeddings")?;
        emb.position_embeddings   = self.embedding(emb.position_embeddings.clone(), "embeddings.position_embeddings")?;
        emb.token_type_embeddings = self.embedding(emb.token_type_embeddings.clone(), "embeddings.token_type_embeddings")?;
        emb.norm = self.layer_norm(emb.norm.clone(), "embeddings.LayerNorm")?;

        for (i, layer) in model.layers.iter_mut().enumerate() {
            let base = format!("encoder.layer.{i}");
            let attn = &mut layer.attention;
            attn.query  = self.linear(attn.query.clone(),  &format!("{base}.attention.self.query"))?;
            attn.key    = self.linear(attn.key.clone(),    &format!("{base}.attention.self.key"))?;
            attn.value  = self.linear(attn.value.clone(),  &format!("{base}.attention.self.value"))?;
            attn.output = self.linear(attn.output.clone(), &format!("{base}.attention.output.dense"))?;
            layer.attention_norm   = self.layer_norm(layer.attention_norm.clone(), &format!("{base}.attention.output.LayerNorm"))?;
            layer.intermediate     = self.linear(layer.intermediate.clone(), &format!("{base}.intermediate.dense"))?;
            layer.output           = self.linear(layer.output.clone(), &format!("{base}.output.dense"))?;
            layer.output_norm      = self.layer_norm(layer.output_norm.clone(), &format!("{base}.output.LayerNorm"))?;
        }

        model.pooler = self.linear(model.pooler.clone(), "pooler.dense")?;
        Ok(model)
    }

    fn embedding(&self, mut embedding: Embedding<B>, name: &str) -> Result<Embedding<B>> {
        let weight = self.tensor::<2>(&format!("{name}.weight"))?;
        check_shape(name, &embedding.weight.val().dims(), &weight.dims())?;
        embedding.weight = Param::from_tensor(weight);
        Ok(embedding)
    }

    fn linear(&self, mut linear: Linear<B>, name: &str) -> Result<Linear<B>> {
        let weight = self.tensor::<2>(&format!("{name}.weight"))?.transpose();
        check_shape(name, &linear.weight.val().dims(), &weight.dims())?;
        linear.weight = Param::from_tensor(weight);
        linear.bias = Some(Param::from_tensor(self.tensor::<1>(&format!("{name}.bias"))?));
        Ok(linear)
    }

    fn layer_norm(&self, mut norm: LayerNorm<B>, name: &str) -> Result<LayerNorm<B>> {
        let gamma = self
            .tensor::<1>(&format!("{name}.weight"))
            .or_else(|_| self.tensor::<1>(&format!("{name}.gamma")))?;
        let beta = self
            .tensor::<1>(&format!("{name}.bias"))
            .or_else(|_| self.tensor::<1>(&format!("{name}.beta")))?;
        check_shape(name, &norm.gamma.val().dims(), &gamma.dims())?;
        norm.gamma = Param::from_tensor(gamma);
        norm.beta = Some(Param::from_tensor(beta));
        Ok(norm)
    }

    fn tensor<const D: usize>(&self, name: &str) -> Result<Tensor<B, D>> {
        let full_name = format!("{}{}", self.prefix, name);
        let view = self
            .tensors
            .tensor(&full_name)
            .map_err(|e| anyhow!("Missing pretrained tensor '{full_name}': {e}"))?;
        if view.shape().len() != D {
            bail!(
                "Tensor '{}' has rank {} but {} was expected",
                full_name,
                view.shape().len(),
                D
            );
        }
        let values = view_to_f32(&view).with_context(|| format!("Tensor '{full_name}'"))?;
        Ok(Tensor::from_data(TensorData::new(values, view.shape().to_vec()), self.device))
    }
}

fn check_shape<const D: usize>(name: &str, expected: &[usize; D], found: &[usize; D]) -> Result<()> {
    if expected != found {
        bail!(
            "Pretrained tensor '{}' has shape {:?}, model expects {:?}",
            name,
            found,
            expected
        );
    }
    Ok(())
}

fn view_to_f32(view: &TensorView<'_>) -> Result<Vec<f32>> {
    match view.dtype() {
        Dtype::F32 => Ok(view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        other => bail!("unsupported dtype {other:?}, expected F32"),
    }
}
