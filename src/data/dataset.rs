use burn::data::dataset::Dataset;

use crate::domain::example::EncodedExample;
use crate::domain::language::LanguageFilter;

/// In-memory dataset of pre-tokenised comments.
#[derive(Debug, Clone, Default)]
pub struct ToxicDataset {
    examples: Vec<EncodedExample>,
}

impl ToxicDataset {
    pub fn new(examples: Vec<EncodedExample>) -> Self { Self { examples } }

    pub fn examples(&self) -> &[EncodedExample] { &self.examples }

    /// Copy of the examples selected by `filter`.
    pub fn filter_language(&self, filter: &LanguageFilter) -> ToxicDataset {
        let examples = self
            .examples
            .iter()
            .filter(|e| filter.matches(e.lang.as_deref()))
            .cloned()
            .collect();
        ToxicDataset::new(examples)
    }

    /// Fraction of labelled examples that are toxic.
    pub fn positive_rate(&self) -> Option<f64> {
        let labels: Vec<bool> = self.examples.iter().filter_map(|e| e.is_toxic()).collect();
        if labels.is_empty() {
            return None;
        }
        Some(labels.iter().filter(|&&t| t).count() as f64 / labels.len() as f64)
    }
}

impl Dataset<EncodedExample> for ToxicDataset {
    fn get(&self, index: usize) -> Option<EncodedExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(lang: &str, label: f32) -> EncodedExample {
        EncodedExample {
            id:             None,
            label:          Some(label),
            lang:           Some(lang.to_string()),
            input_word_ids: vec![101, 102],
            input_mask:     vec![1, 1],
            segment_ids:    vec![0, 0],
        }
    }

    #[test]
    fn test_filter_language() {
        let ds = ToxicDataset::new(vec![example("es", 1.0), example("it", 0.0), example("es", 0.0)]);
        assert_eq!(ds.filter_language(&LanguageFilter::Only("es".into())).len(), 2);
        assert_eq!(ds.filter_language(&LanguageFilter::Only("tr".into())).len(), 0);
        assert_eq!(ds.filter_language(&LanguageFilter::Combined).len(), 3);
    }

    #[test]
    fn test_positive_rate() {
        let ds = ToxicDataset::new(vec![example("es", 1.0), example("it", 0.0)]);
        assert_eq!(ds.positive_rate(), Some(0.5));
        assert_eq!(ToxicDataset::default().positive_rate(), None);
    }
}
