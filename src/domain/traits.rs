// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources and models only
// through these traits, so a CSV file and an in-memory fixture
// (or the real model and a stub in tests) are interchangeable.

use anyhow::Result;
use crate::domain::example::EncodedExample;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce pre-tokenised examples.
///
/// Implementations:
///   - CsvExampleSource → reads the processed Jigsaw CSV files
pub trait ExampleSource {
    fn load_all(&self) -> Result<Vec<EncodedExample>>;
}

// ─── ToxicityScorer ───────────────────────────────────────────────────────────
/// Any component that assigns a toxicity probability to examples.
/// The returned Vec is aligned with the input slice.
///
/// Implementations:
///   - Predictor → fine-tuned BERT classifier
pub trait ToxicityScorer {
    fn score(&self, examples: &[EncodedExample]) -> Result<Vec<f32>>;
}
