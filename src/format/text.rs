//! Plain-text summary table.
//!
//! Columns are padded by display width (`unicode-width`) so labels with
//! wide characters still line up. Label columns are truncated to fit the
//! terminal when a width is given.

use super::rows::SummaryRow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const HEADERS: [&str; 8] = [
    "PROBLEM",
    "SUBPROBLEM",
    "ALGORITHM",
    "RUNS",
    "MEDIAN",
    "IQR",
    "SOLVED",
    "OVERHEAD",
];

/// First column index that is right-aligned (numbers).
const FIRST_NUMERIC: usize = 3;
/// Narrowest a label column is squeezed to.
const MIN_LABEL_WIDTH: usize = 6;

/// Get terminal width, falling back to `COLUMNS` and then 80.
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok((cols, _)) = crossterm::terminal::size() {
        if cols > 0 {
            return usize::from(cols);
        }
    }
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(80)
}

/// Truncate to `max_len` visible columns, marking the cut with `...`.
#[must_use]
pub fn truncate_cell(text: &str, max_len: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_len {
        return text.to_string();
    }
    let (budget, marker) = if max_len > 3 {
        (max_len - 3, "...")
    } else {
        (max_len, "")
    };

    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw > budget {
            break;
        }
        width += cw;
        out.push(c);
    }
    out.push_str(marker);
    out
}

/// Format a value for the table.
#[must_use]
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e5).contains(&magnitude) {
        format!("{value:.2e}")
    } else if magnitude >= 100.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.3}")
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

fn cells(row: &SummaryRow) -> [String; 8] {
    let dash = || "-".to_string();
    let iqr = match (row.final_lower, row.final_upper) {
        (Some(lo), Some(hi)) => format!("{}..{}", format_number(lo), format_number(hi)),
        _ => dash(),
    };
    [
        row.problem.clone(),
        row.subproblem.clone(),
        row.algorithm.clone(),
        row.runs.to_string(),
        row.final_median.map_or_else(dash, format_number),
        iqr,
        percent(row.solved_fraction),
        percent(row.overhead_fraction),
    ]
}

fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(UnicodeWidthStr::width(text)));
    if right {
        format!("{fill}{text}")
    } else {
        format!("{text}{fill}")
    }
}

/// Render rows as an aligned table.
///
/// With `max_width`, the widest label columns are truncated until the table
/// fits (numeric columns are never cut).
#[must_use]
pub fn format_table(rows: &[SummaryRow], max_width: Option<usize>) -> String {
    if rows.is_empty() {
        return "No results.\n".to_string();
    }

    let body: Vec<[String; 8]> = rows.iter().map(cells).collect();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| UnicodeWidthStr::width(*h)).collect();
    for line in &body {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    if let Some(limit) = max_width {
        let gaps = 2 * (widths.len() - 1);
        while widths.iter().sum::<usize>() + gaps > limit {
            let Some((idx, w)) = widths[..FIRST_NUMERIC]
                .iter()
                .copied()
                .enumerate()
                .max_by_key(|(_, w)| *w)
            else {
                break;
            };
            if w <= MIN_LABEL_WIDTH {
                break;
            }
            widths[idx] = w - 1;
        }
    }

    let mut out = String::new();
    let mut push_line = |line: &[String]| {
        let padded: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let cell = truncate_cell(cell, widths[i]);
                pad(&cell, widths[i], i >= FIRST_NUMERIC)
            })
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };

    let header: Vec<String> = HEADERS.iter().map(|h| (*h).to_string()).collect();
    push_line(&header);
    for line in &body {
        push_line(line);
    }
    out
}
