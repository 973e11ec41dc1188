//! Formatting helpers shared by the renderer and the CLI.

use chrono::{DateTime, NaiveDate, Utc};

/// Format a run timestamp for the start/finish lines.
pub fn format_run_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Format a date span as "first to last", or just the date if they match.
pub fn format_date_span(first: NaiveDate, last: NaiveDate) -> String {
    if first == last {
        first.format("%Y-%m-%d").to_string()
    } else {
        format!("{} to {}", first.format("%Y-%m-%d"), last.format("%Y-%m-%d"))
    }
}

/// Format an axis value compactly: integers without decimals, small values
/// with up to two.
pub fn format_axis_value(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else if value.abs() < 10.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Turn a chart label into a file stem.
///
/// Path separators and characters that are awkward on common filesystems
/// become `_`.
pub fn file_stem(label: &str) -> String {
    let stem: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        stem
    }
}
