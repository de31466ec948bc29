// ============================================================
// Layer 6 — Metrics
// ============================================================
// ROC AUC is the benchmark's headline number, reported per
// validation language before and after fine-tuning. Every
// evaluation is also appended to a CSV log:
//
//   checkpoints/metrics.csv
//   phase,language,examples,loss,auc,accuracy
//   before_training,Combined,8000,0.693412,0.512330,0.846250
//   epoch_1,Combined,8000,0.402118,0.781004,0.851125
//   after_training,es,2500,0.381220,0.801776,0.856800

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

/// Area under the ROC curve via the rank-sum (Mann–Whitney U) form.
///
/// Tied scores receive their average rank. Returns `None` when only
/// one class is present, where the curve is undefined.
pub fn roc_auc(scores: &[f32], labels: &[bool]) -> Option<f64> {
    assert_eq!(scores.len(), labels.len(), "scores and labels must align");

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; the tied block i..=j shares their mean.
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] {
                positive_rank_sum += average_rank;
            }
        }
        i = j + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Fraction of examples whose thresholded score matches the label.
pub fn accuracy(scores: &[f32], labels: &[bool], threshold: f32) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let correct = scores
        .iter()
        .zip(labels)
        .filter(|(&s, &l)| (s >= threshold) == l)
        .count();
    correct as f64 / scores.len() as f64
}

/// One evaluation of the model on one language subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub phase:    String,
    pub language: String,
    pub examples: usize,
    pub loss:     f64,
    /// Empty when the subset has a single class
    pub auc:      Option<f64>,
    pub accuracy: f64,
}

impl EvalReport {
    pub fn summary(&self) -> String {
        let auc = self
            .auc
            .map(|a| format!("{a:.4}"))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "{:<16} {:<9} | n={:>6} | loss={:.4} | auc={} | acc={:.1}%",
            self.phase,
            self.language,
            self.examples,
            self.loss,
            auc,
            self.accuracy * 100.0,
        )
    }
}

/// Appends `EvalReport`s to `metrics.csv` in the given directory.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header only when the file is new, so repeated runs append.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join("metrics.csv") })
    }

    pub fn log(&self, report: &EvalReport) -> Result<()> {
        let is_new = !self.csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(MetricsRow::from(report))?;
        writer.flush()?;

        tracing::debug!("Logged metrics: {}", report.summary());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[derive(Serialize)]
struct MetricsRow<'a> {
    phase:    &'a str,
    language: &'a str,
    examples: usize,
    loss:     String,
    auc:      String,
    accuracy: String,
}

impl<'a> From<&'a EvalReport> for MetricsRow<'a> {
    fn from(r: &'a EvalReport) -> Self {
        Self {
            phase:    &r.phase,
            language: &r.language,
            examples: r.examples,
            loss:     format!("{:.6}", r.loss),
            auc:      r.auc.map(|a| format!("{a:.6}")).unwrap_or_default(),
            accuracy: format!("{:.6}", r.accuracy),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation_gives_one() {
        let auc = roc_auc(&[0.1, 0.2, 0.8, 0.9], &[false, false, true, true]).unwrap();
        assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_scores_give_zero() {
        let auc = roc_auc(&[0.9, 0.8, 0.2, 0.1], &[false, false, true, true]).unwrap();
        assert!(auc.abs() < 1e-12);
    }

    #[test]
    fn test_constant_scores_give_half() {
        let auc = roc_auc(&[0.5; 6], &[true, false, true, false, false, true]).unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_partial_ordering() {
        // One of the four positive/negative pairs is mis-ordered.
        let auc = roc_auc(&[0.1, 0.6, 0.4, 0.9], &[false, false, true, true]).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_undefined() {
        assert_eq!(roc_auc(&[0.1, 0.7], &[true, true]), None);
        assert_eq!(roc_auc(&[], &[]), None);
    }

    #[test]
    fn test_accuracy_threshold() {
        let acc = accuracy(&[0.2, 0.7, 0.5, 0.4], &[false, true, false, true], 0.5);
        assert!((acc - 0.5).abs() < 1e-12);
        assert_eq!(accuracy(&[], &[], 0.5), 0.0);
    }

    #[test]
    fn test_logger_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let report = EvalReport {
            phase:    "before_training".into(),
            language: "es".into(),
            examples: 10,
            loss:     0.5,
            auc:      Some(0.75),
            accuracy: 0.8,
        };
        logger.log(&report).unwrap();
        logger.log(&EvalReport { auc: None, ..report }).unwrap();

        let text = std::fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "phase,language,examples,loss,auc,accuracy");
        assert_eq!(lines[1], "before_training,es,10,0.500000,0.750000,0.800000");
        assert_eq!(lines[2], "before_training,es,10,0.500000,,0.800000");
    }
}
