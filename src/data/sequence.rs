// ============================================================
// Layer 4 — Integer-List Columns
// ============================================================
// The processed CSV files store each token sequence as a printed
// tuple inside a single cell:
//
//   "(101, 10117, 12172, 102, 0, 0, ...)"
//
// These helpers turn such a cell back into a fixed-length Vec<u32>
// and render a Vec<u32> in the same format for the `encode` command.

use anyhow::{bail, Context, Result};

/// Parse a printed integer list into exactly `expected_len` values.
///
/// Accepts `( .. )` or `[ .. ]` around the items and arbitrary
/// whitespace between them.
pub fn parse_int_list(text: &str, expected_len: usize) -> Result<Vec<u32>> {
    let trimmed = text.trim();
    let inner = match (trimmed.chars().next(), trimmed.chars().last()) {
        (Some('('), Some(')')) | (Some('['), Some(']')) if trimmed.len() >= 2 => {
            &trimmed[1..trimmed.len() - 1]
        }
        (Some('(' | '['), _) | (_, Some(')' | ']')) => {
            bail!("unbalanced brackets in integer list '{}'", preview(trimmed))
        }
        _ => trimmed,
    };

    let mut items: Vec<&str> = inner.split(',').map(str::trim).collect();
    if items == [""] {
        items.clear();
    } else if items.len() > 1 && items.last() == Some(&"") {
        // Python prints one-element tuples as "(5,)"
        items.pop();
    }

    let values = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if item.is_empty() {
                bail!("item {} is empty in '{}'", i, preview(trimmed));
            }
            item.parse::<u32>()
                .with_context(|| format!("item {} ('{}') is not a non-negative integer", i, item))
        })
        .collect::<Result<Vec<u32>>>()?;

    if values.len() != expected_len {
        bail!(
            "expected {} integers but found {}",
            expected_len,
            values.len()
        );
    }
    Ok(values)
}

/// Render ids as `(a, b, c)`.
pub fn format_int_list(values: &[u32]) -> String {
    let items: Vec<String> = values.iter().map(u32::to_string).collect();
    format!("({})", items.join(", "))
}

fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}
