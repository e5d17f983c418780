//! Numeric token parsing for chart extraction

/// Parse a numeric-looking token as it appears in assistant responses.
///
/// Currency and formatting markers (`,`, `₹`, `$`, `%`, whitespace) are
/// stripped before parsing. Failure is always `None`, never a panic, and
/// non-finite results (`NaN`, `inf`) are rejected.
pub fn parse_numeric_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | '%') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
