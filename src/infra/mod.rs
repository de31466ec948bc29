// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   checkpoint.rs      — CompactRecorder model checkpoints plus
//                        the JSON configs needed to rebuild them
//
//   pretrained.rs      — Hugging Face Hub download and safetensors
//                        loading of the multilingual BERT weights
//
//   tokenizer_store.rs — WordPiece tokenizer used by `encode`
//
//   metrics.rs         — ROC AUC / accuracy and the metrics CSV log
//
//   submission.rs      — the `id,toxic` submission file

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Pretrained weight discovery and loading
pub mod pretrained;

/// Tokenizer loading and fixed-length encoding
pub mod tokenizer_store;

/// Evaluation metrics and CSV logging
pub mod metrics;

/// Submission CSV writer
pub mod submission;
