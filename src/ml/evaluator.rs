// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a labelled subset and summarises it as loss / AUC /
// accuracy. Run once per validation language before training
// (zero-shot baseline of the pretrained encoder with an untrained
// head) and again after fine-tuning on English.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::dataset::ToxicDataset;
use crate::domain::example::EncodedExample;
use crate::domain::language::LanguageFilter;
use crate::infra::metrics::{accuracy, roc_auc, EvalReport, MetricsLogger};
use crate::ml::model::ToxicClassifier;
use crate::ml::predictor::predict_probabilities;

/// Probabilities are clipped this far from 0 and 1 before taking logs.
const PROBABILITY_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub examples: usize,
    pub loss:     f64,
    pub auc:      Option<f64>,
    pub accuracy: f64,
}

impl Evaluation {
    pub fn from_predictions(probabilities: &[f32], labels: &[f32]) -> Self {
        let binary: Vec<bool> = labels.iter().map(|&l| l >= 0.5).collect();
        Self {
            examples: probabilities.len(),
            loss:     binary_cross_entropy(probabilities, labels),
            auc:      roc_auc(probabilities, &binary),
            accuracy: accuracy(probabilities, &binary, 0.5),
        }
    }

    pub fn into_report(self, phase: &str, language: &LanguageFilter) -> EvalReport {
        EvalReport {
            phase:    phase.to_string(),
            language: language.to_string(),
            examples: self.examples,
            loss:     self.loss,
            auc:      self.auc,
            accuracy: self.accuracy,
        }
    }
}

/// Mean binary cross-entropy over probabilities; 0 for an empty set.
pub fn binary_cross_entropy(probabilities: &[f32], labels: &[f32]) -> f64 {
    if probabilities.is_empty() {
        return 0.0;
    }
    let total: f64 = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let p = (p as f64).clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
            let y = y as f64;
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / probabilities.len() as f64
}

/// Evaluate `model` on labelled examples.
pub fn evaluate<B: Backend>(
    model:      &ToxicClassifier<B>,
    examples:   &[EncodedExample],
    batch_size: usize,
) -> Result<Evaluation> {
    let labels = examples
        .iter()
        .enumerate()
        .map(|(i, e)| match e.label {
            Some(l) => Ok(l),
            None => bail!("example {} has no label and cannot be evaluated", i),
        })
        .collect::<Result<Vec<f32>>>()?;

    let probabilities = predict_probabilities(model, examples, batch_size)?;
    Ok(Evaluation::from_predictions(&probabilities, &labels))
}

/// Evaluate every language subset, print and log one report each.
/// Empty subsets are skipped with a warning.
pub fn evaluate_languages<B: Backend>(
    model:      &ToxicClassifier<B>,
    validation: &ToxicDataset,
    filters:    &[LanguageFilter],
    batch_size: usize,
    phase:      &str,
    logger:     Option<&MetricsLogger>,
) -> Result<Vec<EvalReport>> {
    let mut reports = Vec::with_capacity(filters.len());

    for filter in filters {
        let subset = validation.filter_language(filter);
        if subset.examples().is_empty() {
            tracing::warn!("No validation examples for language '{}', skipped", filter);
            continue;
        }

        let report = evaluate(model, subset.examples(), batch_size)?.into_report(phase, filter);
        println!("{}", report.summary());
        if let Some(logger) = logger {
            logger.log(&report)?;
        }
        reports.push(report);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::bert::BertConfig;
    use crate::ml::model::ToxicClassifierConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn example(lang: &str, label: Option<f32>) -> EncodedExample {
        EncodedExample {
            id:             None,
            label,
            lang:           Some(lang.to_string()),
            input_word_ids: vec![1, 5, 2, 0],
            input_mask:     vec![1, 1, 1, 0],
            segment_ids:    vec![0; 4],
        }
    }

    fn tiny_model() -> ToxicClassifier<TestBackend> {
        ToxicClassifierConfig::new(BertConfig::new(16, 8, 1, 2, 16, 4, 2))
            .init::<TestBackend>(&Default::default())
    }

    #[test]
    fn test_bce_of_confident_correct_predictions_is_small() {
        assert!(binary_cross_entropy(&[0.999, 0.001], &[1.0, 0.0]) < 0.01);
        assert!((binary_cross_entropy(&[0.5], &[1.0]) - 2f64.ln()).abs() < 1e-9);
        assert_eq!(binary_cross_entropy(&[], &[]), 0.0);
    }

    #[test]
    fn test_bce_clips_zero_probabilities() {
        assert!(binary_cross_entropy(&[0.0], &[1.0]).is_finite());
    }

    #[test]
    fn test_from_predictions() {
        let e = Evaluation::from_predictions(&[0.9, 0.2, 0.6, 0.1], &[1.0, 0.0, 1.0, 0.0]);
        assert_eq!(e.examples, 4);
        assert_eq!(e.auc, Some(1.0));
        assert_eq!(e.accuracy, 1.0);
    }

    #[test]
    fn test_unlabelled_examples_cannot_be_evaluated() {
        assert!(evaluate(&tiny_model(), &[example("es", None)], 2).is_err());
    }

    #[test]
    fn test_reports_per_language_and_skips_empty() {
        let validation = ToxicDataset::new(vec![
            example("es", Some(1.0)),
            example("es", Some(0.0)),
            example("it", Some(0.0)),
        ]);
        let filters = LanguageFilter::evaluation_set(&["es", "it", "tr"]);

        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let reports =
            evaluate_languages(&tiny_model(), &validation, &filters, 2, "before_training", Some(&logger))
                .unwrap();

        let languages: Vec<&str> = reports.iter().map(|r| r.language.as_str()).collect();
        assert_eq!(languages, vec!["Combined", "es", "it"]);
        assert_eq!(reports[0].examples, 3);
        // Identical inputs score identically, so AUC is exactly 0.5.
        assert_eq!(reports[1].auc, Some(0.5));
        // "it" has one class only.
        assert_eq!(reports[2].auc, None);

        let logged = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(logged.lines().count(), 4);
    }
}
