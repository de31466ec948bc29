// ============================================================
// Layer 3 — Language Selection
// ============================================================
// Zero-shot transfer is measured per language: the validation
// set mixes Spanish, Italian and Turkish comments, and each one
// is scored on its own as well as all together ("Combined").

use std::fmt;

use serde::{Deserialize, Serialize};

/// Languages present in the multilingual validation set.
pub const VALIDATION_LANGUAGES: [&str; 3] = ["es", "it", "tr"];

/// Selects a subset of validation examples by language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageFilter {
    /// Every example regardless of language
    Combined,
    /// Only examples whose `lang` column equals this code
    Only(String),
}

impl LanguageFilter {
    /// `Combined` followed by one filter per language code.
    pub fn evaluation_set<S: AsRef<str>>(languages: &[S]) -> Vec<LanguageFilter> {
        let mut filters = vec![LanguageFilter::Combined];
        filters.extend(languages.iter().map(|l| LanguageFilter::Only(l.as_ref().to_string())));
        filters
    }

    pub fn matches(&self, lang: Option<&str>) -> bool {
        match self {
            LanguageFilter::Combined => true,
            LanguageFilter::Only(code) => lang == Some(code.as_str()),
        }
    }
}

impl fmt::Display for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageFilter::Combined => write!(f, "Combined"),
            LanguageFilter::Only(code) => write!(f, "{code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_matches_everything() {
        assert!(LanguageFilter::Combined.matches(Some("tr")));
        assert!(LanguageFilter::Combined.matches(None));
    }

    #[test]
    fn test_only_matches_exact_code() {
        let es = LanguageFilter::Only("es".into());
        assert!(es.matches(Some("es")));
        assert!(!es.matches(Some("it")));
        assert!(!es.matches(None));
    }

    #[test]
    fn test_evaluation_set_starts_with_combined() {
        let set = LanguageFilter::evaluation_set(&VALIDATION_LANGUAGES);
        assert_eq!(set.len(), 4);
        assert_eq!(set[0], LanguageFilter::Combined);
        assert_eq!(set[3].to_string(), "tr");
    }
}
