// ============================================================
// Layer 4 — Processed CSV Loader
// ============================================================
// Reads the pre-tokenised Jigsaw CSV files with the `csv` crate.
//
// Expected header (extra columns such as comment_text are ignored):
//
//   id, [toxic], [lang], input_word_ids, input_mask, all_segment_id
//
// Columns are located by header name, so column order in the file
// does not matter. The label column name is configurable because
// the training, validation and test files disagree on it.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

use crate::data::sequence::parse_int_list;
use crate::domain::example::{EncodedExample, DEFAULT_SEQ_LEN};
use crate::domain::traits::ExampleSource;

pub const ID_COLUMN:          &str = "id";
pub const LANG_COLUMN:        &str = "lang";
pub const WORD_IDS_COLUMN:    &str = "input_word_ids";
pub const MASK_COLUMN:        &str = "input_mask";
pub const SEGMENT_IDS_COLUMN: &str = "all_segment_id";
pub const DEFAULT_LABEL_COLUMN: &str = "toxic";

/// Loads `EncodedExample`s from one processed CSV file.
#[derive(Debug, Clone)]
pub struct CsvExampleSource {
    path:          PathBuf,
    seq_len:       usize,
    label_column:  String,
    require_label: bool,
    require_id:    bool,
}

impl CsvExampleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:          path.into(),
            seq_len:       DEFAULT_SEQ_LEN,
            label_column:  DEFAULT_LABEL_COLUMN.to_string(),
            require_label: false,
            require_id:    false,
        }
    }

    /// Source for labelled data (training / validation)
    pub fn labelled(path: impl Into<PathBuf>) -> Self {
        Self::new(path).with_required_label(true)
    }

    /// Source for the unlabeled test set, keyed by `id`
    pub fn unlabelled(path: impl Into<PathBuf>) -> Self {
        Self::new(path).with_required_id(true)
    }

    pub fn with_seq_len(mut self, seq_len: usize) -> Self {
        self.seq_len = seq_len;
        self
    }

    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }

    pub fn with_required_label(mut self, required: bool) -> Self {
        self.require_label = required;
        self
    }

    pub fn with_required_id(mut self, required: bool) -> Self {
        self.require_id = required;
        self
    }
}

/// Positions of the columns we care about inside a header row.
#[derive(Debug)]
struct ColumnIndex {
    id:          Option<usize>,
    label:       Option<usize>,
    lang:        Option<usize>,
    word_ids:    usize,
    mask:        usize,
    segment_ids: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord, label_column: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| anyhow!("missing required column '{name}'"))
        };

        Ok(Self {
            id:          find(ID_COLUMN),
            label:       find(label_column),
            lang:        find(LANG_COLUMN),
            word_ids:    require(WORD_IDS_COLUMN)?,
            mask:        require(MASK_COLUMN)?,
            segment_ids: require(SEGMENT_IDS_COLUMN)?,
        })
    }
}

impl ExampleSource for CsvExampleSource {
    fn load_all(&self) -> Result<Vec<EncodedExample>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
            .clone();
        let columns = ColumnIndex::from_headers(&headers, &self.label_column)
            .with_context(|| format!("Unexpected layout in '{}'", self.path.display()))?;

        if self.require_label && columns.label.is_none() {
            bail!(
                "'{}' has no label column '{}'",
                self.path.display(),
                self.label_column
            );
        }
        if self.require_id && columns.id.is_none() {
            bail!("'{}' has no '{}' column", self.path.display(), ID_COLUMN);
        }

        let mut examples = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Malformed CSV row {} in '{}'", row + 1, self.path.display())
            })?;
            let example = parse_record(&record, &columns, self.seq_len).with_context(|| {
                format!("Invalid row {} in '{}'", row + 1, self.path.display())
            })?;
            examples.push(example);
        }

        tracing::info!(
            "Loaded {} examples from '{}'",
            examples.len(),
            self.path.display()
        );
        Ok(examples)
    }
}

fn parse_record(
    record:  &csv::StringRecord,
    columns: &ColumnIndex,
    seq_len: usize,
) -> Result<EncodedExample> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let label = match columns.label {
        Some(idx) => Some(parse_label(field(idx))?),
        None => None,
    };

    Ok(EncodedExample {
        id:             columns.id.map(|idx| field(idx).trim().to_string()),
        label,
        lang:           columns.lang.map(|idx| field(idx).trim().to_string()),
        input_word_ids: parse_int_list(field(columns.word_ids), seq_len)
            .with_context(|| format!("column '{WORD_IDS_COLUMN}'"))?,
        input_mask:     parse_int_list(field(columns.mask), seq_len)
            .with_context(|| format!("column '{MASK_COLUMN}'"))?,
        segment_ids:    parse_int_list(field(columns.segment_ids), seq_len)
            .with_context(|| format!("column '{SEGMENT_IDS_COLUMN}'"))?,
    })
}

/// Labels are 0/1 in the English set but may be written as floats.
fn parse_label(text: &str) -> Result<f32> {
    let value: f32 = text
        .trim()
        .parse()
        .with_context(|| format!("label '{}' is not a number", text))?;
    if !(0.0..=1.0).contains(&value) {
        bail!("label {} is outside [0, 1]", value);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_loads_labelled_rows() {
        let file = write_csv(
            "id,comment_text,input_word_ids,input_mask,all_segment_id,toxic\n\
             a1,\"hi, you\",\"(101, 5, 102, 0)\",\"(1, 1, 1, 0)\",\"(0, 0, 0, 0)\",1\n\
             a2,fine,\"(101, 6, 102, 0)\",\"(1, 1, 1, 0)\",\"(0, 0, 0, 0)\",0\n",
        );
        let examples = CsvExampleSource::labelled(file.path())
            .with_seq_len(4)
            .load_all()
            .unwrap();

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].id.as_deref(), Some("a1"));
        assert_eq!(examples[0].label, Some(1.0));
        assert_eq!(examples[1].input_word_ids, vec![101, 6, 102, 0]);
        assert_eq!(examples[1].lang, None);
    }

    #[test]
    fn test_reads_language_column() {
        let file = write_csv(
            "id,lang,toxic,input_word_ids,input_mask,all_segment_id\n\
             0,tr,0.0,\"(1, 2)\",\"(1, 1)\",\"(0, 0)\"\n",
        );
        let examples = CsvExampleSource::labelled(file.path())
            .with_seq_len(2)
            .load_all()
            .unwrap();
        assert_eq!(examples[0].lang.as_deref(), Some("tr"));
    }

    #[test]
    fn test_unlabelled_source_keeps_ids_verbatim() {
        let file = write_csv(
            "id,content,input_word_ids,input_mask,all_segment_id\n\
             007,x,\"(1, 2)\",\"(1, 1)\",\"(0, 0)\"\n",
        );
        let examples = CsvExampleSource::unlabelled(file.path())
            .with_seq_len(2)
            .load_all()
            .unwrap();
        assert_eq!(examples[0].id.as_deref(), Some("007"));
        assert_eq!(examples[0].label, None);
    }

    #[test]
    fn test_missing_sequence_column_is_an_error() {
        let file = write_csv("id,input_word_ids,input_mask\n1,\"(1)\",\"(1)\"\n");
        let err = CsvExampleSource::new(file.path())
            .with_seq_len(1)
            .load_all()
            .unwrap_err();
        assert!(format!("{err:#}").contains(SEGMENT_IDS_COLUMN));
    }

    #[test]
    fn test_required_label_must_exist() {
        let file = write_csv("id,input_word_ids,input_mask,all_segment_id\n");
        assert!(CsvExampleSource::labelled(file.path()).load_all().is_err());
    }

    #[test]
    fn test_wrong_sequence_length_names_the_row() {
        let file = write_csv(
            "toxic,input_word_ids,input_mask,all_segment_id\n\
             1,\"(1, 2, 3)\",\"(1, 1)\",\"(0, 0)\"\n",
        );
        let err = CsvExampleSource::labelled(file.path())
            .with_seq_len(2)
            .load_all()
            .unwrap_err();
        assert!(format!("{err:#}").contains("row 1"));
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        assert!(parse_label("1.5").is_err());
        assert!(parse_label("nope").is_err());
        assert_eq!(parse_label(" 0 ").unwrap(), 0.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = CsvExampleSource::new("/definitely/not/here.csv")
            .load_all()
            .unwrap_err();
        assert!(err.to_string().contains("Cannot open dataset"));
    }
}
