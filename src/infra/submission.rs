// ============================================================
// Layer 6 — Submission Writer
// ============================================================
// The benchmark's deliverable:
//
//   id,toxic
//   0,0.031447
//   1,0.912008
//
// One row per test example in input order; `id` is the original
// identifier string and `toxic` a probability with six decimals.

use anyhow::{bail, Context, Result};
use std::{fs::File, io::Write, path::Path};

pub const SUBMISSION_HEADER: [&str; 2] = ["id", "toxic"];

/// Write `(id, probability)` rows to any writer.
pub fn write_submission<W: Write>(writer: W, ids: &[String], probabilities: &[f32]) -> Result<()> {
    if ids.len() != probabilities.len() {
        bail!(
            "{} ids but {} predictions; every test example needs exactly one prediction",
            ids.len(),
            probabilities.len()
        );
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(SUBMISSION_HEADER)?;
    for (id, p) in ids.iter().zip(probabilities) {
        if !p.is_finite() {
            bail!("prediction for id '{}' is not finite ({})", id, p);
        }
        let p = p.clamp(0.0, 1.0);
        csv.write_record([id.as_str(), format!("{p:.6}").as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the submission file at `path`, creating parent directories.
pub fn write_submission_file(path: &Path, ids: &[String], probabilities: &[f32]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Cannot create submission '{}'", path.display()))?;
    write_submission(file, ids, probabilities)?;
    tracing::info!("Wrote {} predictions to '{}'", ids.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(ids: &[&str], probs: &[f32]) -> Result<String> {
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        write_submission(&mut out, &ids, probs)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_header_and_six_decimals() {
        let text = render(&["0", "17"], &[0.5, 0.1234567]).unwrap();
        assert_eq!(text, "id,toxic\n0,0.500000\n17,0.123457\n");
    }

    #[test]
    fn test_every_row_has_two_columns_and_a_probability() {
        let probs = [0.0, 1.0, 0.25, 0.999_999_9];
        let text = render(&["a", "b", "c", "d"], &probs).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), probs.len());
        for row in rows {
            let cols: Vec<&str> = row.split(',').collect();
            assert_eq!(cols.len(), 2);
            let p: f64 = cols[1].parse().unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(render(&["a", "b"], &[0.1]).is_err());
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(render(&["a"], &[f32::NAN]).is_err());
    }

    #[test]
    fn test_writes_file_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("submission.csv");
        write_submission_file(&path, &["9".to_string()], &[0.75]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,toxic\n9,0.750000\n");
    }
}
