//! Row extraction from assistant response text
//!
//! Three independent pattern matchers scan the text, each a pure function of
//! the input. Matches are concatenated in pass order (tables, colon lines,
//! bold bullets) behind a shared dedup: the first writer of a label wins,
//! labels compared exactly after trimming.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::numeric::parse_numeric_value;
use super::ChartDatum;

/// Compiled patterns for the regex-based passes
struct RowPatterns {
    /// `Label: ₹1,50,000` anywhere in the text; label is 1-40 chars and
    /// starts with a letter
    colon: Regex,
    /// `- **Label**: 42` list lines with a bolded label
    bullet: Regex,
}

static PATTERNS: Lazy<RowPatterns> = Lazy::new(|| RowPatterns {
    colon: Regex::new(
        r"([A-Za-z][A-Za-z0-9 _/()&.'-]{0,39}):\s*(?:[₹$]\s*)?([0-9][0-9,]*(?:\.[0-9]+)?)\s*%?",
    )
    .unwrap(),
    bullet: Regex::new(
        r"(?m)^\s*[-*]\s+\*{1,2}([^*\n]+?)\*{1,2}\s*:?\s*(?:[₹$]\s*)?([0-9][0-9,]*(?:\.[0-9]+)?)\s*%?",
    )
    .unwrap(),
});

/// Extract label/value rows from response text.
///
/// Pure function of the input: identical content yields identical rows.
pub fn extract_rows(content: &str) -> Vec<ChartDatum> {
    let mut rows = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let candidates = table_rows(content)
        .into_iter()
        .chain(colon_rows(content))
        .chain(bullet_rows(content));

    for datum in candidates {
        if datum.label.is_empty() {
            continue;
        }
        if seen.insert(datum.label.clone()) {
            rows.push(datum);
        }
    }

    rows
}

/// Pass 1: markdown table rows (`| Label | 123 | ... |`)
fn table_rows(content: &str) -> Vec<ChartDatum> {
    let mut out = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.len() < 2 || !line.starts_with('|') || !line.ends_with('|') {
            continue;
        }

        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();

        if cells.len() < 2 || is_separator_cell(cells[1]) {
            continue;
        }

        if let Some(value) = parse_numeric_value(cells[1]) {
            out.push(ChartDatum {
                label: cells[0].to_string(),
                value,
            });
        }
    }

    out
}

/// `---`, `:---:` and friends in the value column mark a header separator row
fn is_separator_cell(cell: &str) -> bool {
    cell.contains('-') && cell.chars().all(|c| matches!(c, '-' | ':' | ' '))
}

/// Pass 2: `Label: value` matches over the whole text
fn colon_rows(content: &str) -> Vec<ChartDatum> {
    PATTERNS
        .colon
        .captures_iter(content)
        .filter_map(|caps| {
            let label = caps[1].trim().to_string();
            parse_numeric_value(&caps[2]).map(|value| ChartDatum { label, value })
        })
        .collect()
}

/// Pass 3: list lines with a bolded label (`- **Label** 42`)
fn bullet_rows(content: &str) -> Vec<ChartDatum> {
    PATTERNS
        .bullet
        .captures_iter(content)
        .filter_map(|caps| {
            let label = caps[1].trim().to_string();
            parse_numeric_value(&caps[2]).map(|value| ChartDatum { label, value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, value: f64) -> ChartDatum {
        ChartDatum {
            label: label.into(),
            value,
        }
    }

    #[test]
    fn test_markdown_table_row() {
        let rows = extract_rows("| A | 123 |");
        assert_eq!(rows, vec![row("A", 123.0)]);
    }

    #[test]
    fn test_table_skips_header_and_separator() {
        let content = "| Scheme | Return |\n|---|---|\n| PPF | 7.1 |\n| NSC | 7.7 |";
        let rows = extract_rows(content);
        assert_eq!(rows, vec![row("PPF", 7.1), row("NSC", 7.7)]);
    }

    #[test]
    fn test_colon_row_with_currency() {
        let rows = extract_rows("Tax: ₹1,50,000");
        assert_eq!(rows, vec![row("Tax", 150_000.0)]);
    }

    #[test]
    fn test_colon_rows_across_lines() {
        let rows = extract_rows("Basic: 50000\nHRA: 20000");
        assert_eq!(rows, vec![row("Basic", 50_000.0), row("HRA", 20_000.0)]);
    }

    #[test]
    fn test_bold_bullet_rows() {
        let content = "- **Equity**: 60%\n* *Debt* 30\n- **Gold**: ₹10,000";
        let rows = extract_rows(content);
        assert_eq!(
            rows,
            vec![row("Equity", 60.0), row("Debt", 30.0), row("Gold", 10_000.0)]
        );
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let rows = extract_rows("A: 10\nA: 20");
        assert_eq!(rows, vec![row("A", 10.0)]);
    }

    #[test]
    fn test_dedup_across_passes() {
        // The table pass runs first, so its value wins over the bullet line
        let content = "| Tax | 100 |\n- **Tax**: 200";
        let rows = extract_rows(content);
        assert_eq!(rows, vec![row("Tax", 100.0)]);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let rows = extract_rows("tax: 10\nTax: 20");
        assert_eq!(rows, vec![row("tax", 10.0), row("Tax", 20.0)]);
    }

    #[test]
    fn test_unparseable_values_are_dropped() {
        let rows = extract_rows("| Item | Amount |\nNote: none");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let content = "| A | 1 |\nB: 2\n- **C**: 3";
        assert_eq!(extract_rows(content), extract_rows(content));
    }
}
