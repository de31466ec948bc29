// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-facing goal (run the benchmark, score a checkpoint,
// write a submission, or encode raw text).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - No direct file formats here (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Load → evaluate → fine-tune → evaluate → predict
pub mod benchmark_use_case;

// Per-language metrics for a saved checkpoint
pub mod evaluate_use_case;

// Submission file from a saved checkpoint
pub mod predict_use_case;

// Raw text CSV → pre-tokenized CSV
pub mod encode_use_case;
