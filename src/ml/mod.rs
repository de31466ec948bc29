// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here:
//
//   bert.rs       — BERT encoder (embeddings, self-attention
//                   layers, pooler) that pretrained multilingual
//                   weights are loaded into
//
//   model.rs      — ToxicClassifier: pooled [CLS] → Dense(32) →
//                   Dense(1), plus the logit-space BCE loss
//
//   trainer.rs    — Adam fine-tuning loop with per-epoch
//                   validation and checkpointing
//
//   evaluator.rs  — loss / AUC / accuracy per validation language
//
//   predictor.rs  — order-preserving batched inference
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Devlin et al. (2019) BERT

/// Backend used for fine-tuning (gradients tracked)
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend used for evaluation-only and prediction-only runs
pub type InferBackend = burn::backend::Wgpu;

/// BERT encoder architecture
pub mod bert;

/// Classification head and loss
pub mod model;

/// Fine-tuning loop
pub mod trainer;

/// Per-language evaluation
pub mod evaluator;

/// Batched inference
pub mod predictor;
