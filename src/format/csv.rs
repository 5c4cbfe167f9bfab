//! CSV formatting of summary rows.
//!
//! Fields containing commas, quotes or newlines are quoted per RFC 4180.

use super::rows::SummaryRow;
use std::io::{self, Write};

/// Column names, in output order.
pub const FIELDS: &[&str] = &[
    "problem",
    "subproblem",
    "algorithm",
    "runs",
    "final_tick",
    "final_median",
    "final_lower",
    "final_upper",
    "ci_low",
    "ci_high",
    "solved_fraction",
    "overhead_fraction",
    "alg_time_per_eval",
    "overhead_skipped",
];

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
/// Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Format one row (no trailing newline).
#[must_use]
pub fn format_row(row: &SummaryRow) -> String {
    let ci = row.median_ci;
    [
        escape_field(&row.problem),
        escape_field(&row.subproblem),
        escape_field(&row.algorithm),
        row.runs.to_string(),
        number(row.final_tick),
        number(row.final_median),
        number(row.final_lower),
        number(row.final_upper),
        number(ci.map(|c| c[0])),
        number(ci.map(|c| c[1])),
        row.solved_fraction.to_string(),
        row.overhead_fraction.to_string(),
        row.alg_time_per_eval.to_string(),
        row.overhead_skipped.to_string(),
    ]
    .join(",")
}

/// Write header and rows.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(writer: &mut W, rows: &[SummaryRow]) -> io::Result<()> {
    writeln!(writer, "{}", FIELDS.join(","))?;
    for row in rows {
        writeln!(writer, "{}", format_row(row))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SummaryRow {
        SummaryRow {
            problem: "goris2015".into(),
            subproblem: "S7@me".into(),
            algorithm: "vbmc, fast".into(),
            runs: 2,
            final_tick: Some(100.0),
            final_median: Some(1.0),
            final_lower: Some(0.5),
            final_upper: Some(1.5),
            median_ci: None,
            solved_fraction: 0.5,
            overhead_fraction: 0.0,
            alg_time_per_eval: 0.0,
            overhead_skipped: 0,
        }
    }

    #[test]
    fn test_escape_field_plain() {
        assert_eq!(escape_field("hello"), "hello");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_escape_field_with_comma() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn test_escape_field_with_quotes() {
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_escape_field_with_newline() {
        assert_eq!(escape_field("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_row_format() {
        assert_eq!(
            format_row(&row()),
            "goris2015,S7@me,\"vbmc, fast\",2,100,1,0.5,1.5,,,0.5,0,0,0"
        );
    }

    #[test]
    fn test_write_header_and_rows() {
        let rows = vec![row()];
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let written = String::from_utf8(buf).unwrap();
        assert_eq!(written.lines().nth(1), Some(format_row(&row()).as_str()));
        assert_eq!(written.lines().count(), 2);
        assert!(written.starts_with("problem,subproblem,algorithm,runs,"));
    }
}
