//! Numeric token parsing for statement cells.

use tracing::trace;

use super::patterns::{NUMBER, PAREN_NEGATIVE, SPLIT_AFTER_SEPARATOR, SPLIT_BEFORE_SEPARATOR};
use crate::error::ExtractionError;
use crate::layout::Row;

/// A number parsed out of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericToken {
    /// Signed value as printed.
    pub value: f64,
    /// Left edge of the originating cell.
    pub x0: f64,
    /// The literal had no fractional part.
    pub integral: bool,
}

/// Parse one numeric literal such as "1,119.18", "-50.62" or "1.234.56".
///
/// Commas are grouping separators. When several dots remain, all but the
/// last one are grouping noise.
pub fn parse_amount(literal: &str) -> Result<f64, ExtractionError> {
    let trimmed = literal.trim().trim_end_matches([',', '.']);
    let mut cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();

    if cleaned.matches('.').count() > 1 {
        if let Some(last) = cleaned.rfind('.') {
            let (head, tail) = cleaned.split_at(last);
            cleaned = format!("{}{}", head.replace('.', ""), tail);
        }
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ExtractionError::UnparsableToken(literal.to_string()))
}

/// All numbers in a cell's text, tagged with the cell's `x0`.
///
/// Unparsable fragments are skipped.
pub fn numbers_in(text: &str, x0: f64) -> Vec<NumericToken> {
    let joined = SPLIT_BEFORE_SEPARATOR.replace_all(text, "$1$2");
    let joined = SPLIT_AFTER_SEPARATOR.replace_all(&joined, "$1$2");
    let signed = PAREN_NEGATIVE.replace_all(&joined, "-$1");

    NUMBER
        .find_iter(&signed)
        .filter_map(|m| match parse_amount(m.as_str()) {
            Ok(value) => Some(NumericToken {
                value,
                x0,
                integral: !m.as_str().trim_end_matches([',', '.']).contains('.'),
            }),
            Err(e) => {
                trace!("Skipping token: {}", e);
                None
            }
        })
        .collect()
}

/// Numbers in the value part of a row, left to right.
///
/// Digits inside the label ("Face value Rs 10", a leading serial) are not
/// candidates.
pub fn row_numbers(row: &Row) -> Vec<NumericToken> {
    row.value_parts()
        .into_iter()
        .flat_map(|(text, x0)| numbers_in(text, x0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Cell;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,119.18").unwrap(), 1119.18);
        assert_eq!(parse_amount("1.234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-50.62").unwrap(), -50.62);
        assert_eq!(parse_amount("2025.").unwrap(), 2025.0);
        assert_eq!(
            parse_amount(",."),
            Err(ExtractionError::UnparsableToken(",.".to_string()))
        );
    }

    #[test]
    fn test_parenthesized_negative() {
        let tokens = numbers_in("(50.62)", 300.0);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, -50.62);
        assert_eq!(tokens[0].x0, 300.0);
        assert!(!tokens[0].integral);
    }

    #[test]
    fn test_rejoins_split_digits() {
        let values: Vec<f64> = numbers_in("1 ,119.18  1,042. 30", 0.0)
            .iter()
            .map(|t| t.value)
            .collect();
        assert_eq!(values, vec![1119.18, 1042.30]);
    }

    #[test]
    fn test_integral_flag() {
        let tokens = numbers_in("25 6171.59 1,200", 0.0);
        let flags: Vec<bool> = tokens.iter().map(|t| t.integral).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_row_numbers_keep_cell_positions() {
        let row = Row {
            top: 0.0,
            cells: vec![
                Cell::new("Revenue from Operations", 20.0, 150.0),
                Cell::new("1,119.18", 300.0, 340.0),
                Cell::new("1,042.30", 400.0, 440.0),
            ],
        };
        let tokens = row_numbers(&row);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].x0, 400.0);
        assert_eq!(tokens[1].value, 1042.30);
    }

    #[test]
    fn test_row_numbers_skip_label_digits() {
        let row = Row {
            top: 0.0,
            cells: vec![
                Cell::new("Basic EPS (Face value Rs 10 each)", 20.0, 180.0),
                Cell::new("49.93", 300.0, 330.0),
            ],
        };
        let values: Vec<f64> = row_numbers(&row).iter().map(|t| t.value).collect();
        assert_eq!(values, vec![49.93]);
    }
}
