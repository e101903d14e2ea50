//! Reporting-period column discovery.

use chrono::{Datelike, Local};
use serde::Serialize;
use tracing::debug;

use super::patterns::{DAY_MONTH, FOUR_DIGIT_YEAR, SHORT_DATE_YEAR};
use crate::layout::Row;

/// Header words of cumulative or annual columns.
const CUMULATIVE_MARKERS: [&str; 5] = ["hy", "year", "half", "nine", "ytd"];

/// Horizontal position of the target period's column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    /// Left edge of the header cell.
    pub x0: f64,
    /// Year the header refers to.
    pub year: i32,
}

/// Find the column of the most recent quarter in the header rows.
///
/// The reporting year is tried first, then the one before it. Cells naming
/// a half-year, nine-month or annual period are ignored.
pub fn discover_anchor(rows: &[Row], scan_rows: usize, reporting_year: Option<i32>) -> Option<Anchor> {
    let header = &rows[..rows.len().min(scan_rows)];
    let year = reporting_year.or_else(|| infer_reporting_year(header))?;

    for target in [year, year - 1] {
        for row in header {
            for cell in &row.cells {
                let text = cell.text.to_lowercase();
                if CUMULATIVE_MARKERS.iter().any(|m| text.contains(m)) {
                    continue;
                }
                if DAY_MONTH.is_match(&text) && mentions_year(&text, target) {
                    debug!("Anchor column at x0={:.1} ('{}')", cell.x0, cell.text);
                    return Some(Anchor { x0: cell.x0, year: target });
                }
            }
        }
    }

    debug!("No anchor column for {} or {}", year, year - 1);
    None
}

/// Largest plausible year named in the header rows.
pub fn infer_reporting_year(rows: &[Row]) -> Option<i32> {
    let ceiling = Local::now().year() + 1;

    rows.iter()
        .flat_map(|row| row.cells.iter())
        .flat_map(|cell| years_in(&cell.text))
        .filter(|y| (2000..=ceiling).contains(y))
        .max()
}

fn years_in(text: &str) -> Vec<i32> {
    let long = FOUR_DIGIT_YEAR
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<i32>().ok());
    let short = SHORT_DATE_YEAR
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<i32>().ok())
        .map(|y| 2000 + y);
    long.chain(short).collect()
}

fn mentions_year(text: &str, year: i32) -> bool {
    years_in(text).contains(&year)
}
