// ============================================================
// Layer 2 — Encode Use Case
// ============================================================
// Produces the pre-tokenized CSV layout the benchmark reads from
// a raw-text CSV:
//
//   id,comment_text,toxic,...   →   id,comment_text,toxic,...,
//                                   input_word_ids,input_mask,all_segment_id
//
// Every input column is passed through unchanged; the three
// encoded columns are appended, each a "(a, b, ...)" list of
// exactly seq_len integers.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

use crate::data::csv_source::{MASK_COLUMN, SEGMENT_IDS_COLUMN, WORD_IDS_COLUMN};
use crate::data::sequence::format_int_list;
use crate::infra::tokenizer_store::TokenizerStore;

/// Text column names tried in order when none is given.
/// The English training files use `comment_text`, the test file `content`.
pub const TEXT_COLUMNS: [&str; 2] = ["comment_text", "content"];

pub struct EncodeUseCase {
    input:       PathBuf,
    output:      PathBuf,
    text_column: Option<String>,
}

impl EncodeUseCase {
    pub fn new(input: PathBuf, output: PathBuf, text_column: Option<String>) -> Self {
        Self { input, output, text_column }
    }

    /// Encode every row and return how many were written.
    pub fn execute(&self, tokenizer: &TokenizerStore) -> Result<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.input)
            .with_context(|| format!("Cannot open '{}'", self.input.display()))?;
        let headers = reader.headers()?.clone();

        if let Some(existing) = headers
            .iter()
            .find(|h| [WORD_IDS_COLUMN, MASK_COLUMN, SEGMENT_IDS_COLUMN].contains(h))
        {
            bail!("'{}' already has an encoded column '{}'", self.input.display(), existing);
        }

        let text_idx = self.text_column_index(&headers)?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        let mut writer = csv::Writer::from_path(&self.output)
            .with_context(|| format!("Cannot create '{}'", self.output.display()))?;

        let mut out_headers = headers.clone();
        out_headers.push_field(WORD_IDS_COLUMN);
        out_headers.push_field(MASK_COLUMN);
        out_headers.push_field(SEGMENT_IDS_COLUMN);
        writer.write_record(&out_headers)?;

        let mut rows = 0usize;
        for (row, record) in reader.records().enumerate() {
            let mut record = record
                .with_context(|| format!("Malformed CSV row {} in '{}'", row + 1, self.input.display()))?;
            let text = record.get(text_idx).unwrap_or("");
            let encoded = tokenizer
                .encode(text)
                .with_context(|| format!("Cannot encode row {}", row + 1))?;

            record.push_field(&format_int_list(&encoded.input_word_ids));
            record.push_field(&format_int_list(&encoded.input_mask));
            record.push_field(&format_int_list(&encoded.segment_ids));
            writer.write_record(&record)?;
            rows += 1;

            if rows % 10_000 == 0 {
                tracing::debug!("Encoded {} rows", rows);
            }
        }
        writer.flush()?;

        tracing::info!(
            "Encoded {} rows from '{}' into '{}' (seq_len={})",
            rows,
            self.input.display(),
            self.output.display(),
            tokenizer.seq_len()
        );
        Ok(rows)
    }

    fn text_column_index(&self, headers: &csv::StringRecord) -> Result<usize> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        match &self.text_column {
            Some(name) => position(name)
                .ok_or_else(|| anyhow!("'{}' has no column '{}'", self.input.display(), name)),
            None => TEXT_COLUMNS.iter().find_map(|name| position(name)).ok_or_else(|| {
                anyhow!(
                    "'{}' has none of the text columns {:?}; pass --text-column",
                    self.input.display(),
                    TEXT_COLUMNS
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::csv_source::CsvExampleSource;
    use crate::domain::traits::ExampleSource;
    use crate::infra::tokenizer_store::fixtures::store as tokenizer;
    use std::fs;

    #[test]
    fn test_output_loads_as_labelled_examples() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        let output = dir.path().join("processed").join("train.csv");
        fs::write(&input, "id,comment_text,toxic\n0,you are nice,0\n1,\"nice, nice\",1\n").unwrap();

        let rows = EncodeUseCase::new(input, output.clone(), None).execute(&tokenizer(6)).unwrap();
        assert_eq!(rows, 2);

        let examples = CsvExampleSource::labelled(&output).with_seq_len(6).load_all().unwrap();
        assert_eq!(examples[0].input_word_ids, vec![2, 4, 5, 6, 3, 0]);
        assert_eq!(examples[0].input_mask, vec![1, 1, 1, 1, 1, 0]);
        assert_eq!(examples[1].label, Some(1.0));
        assert_eq!(examples[1].id.as_deref(), Some("1"));
    }

    #[test]
    fn test_content_column_is_found_for_test_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("test.csv");
        let output = dir.path().join("test-processed.csv");
        fs::write(&input, "id,content,lang\n9,you,es\n").unwrap();

        EncodeUseCase::new(input, output.clone(), None).execute(&tokenizer(4)).unwrap();
        let written = fs::read_to_string(output).unwrap();
        assert!(written.starts_with("id,content,lang,input_word_ids,input_mask,all_segment_id"));
        assert!(written.contains("\"(2, 4, 3, 0)\""));
    }

    #[test]
    fn test_missing_text_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, "id,body\n0,hi\n").unwrap();
        let err = EncodeUseCase::new(input, dir.path().join("out.csv"), None)
            .execute(&tokenizer(4))
            .unwrap_err();
        assert!(err.to_string().contains("--text-column"));
    }
}
