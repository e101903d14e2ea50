//! Token, cell and row reconstruction.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::normalize_label;

/// Gaps at or below this are glyph splits and join without a space.
const TOUCHING_GAP: f64 = 0.5;

/// A positioned fragment of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Text content.
    pub text: String,
    /// Left edge.
    pub x0: f64,
    /// Right edge.
    pub x1: f64,
    /// Top edge, growing downwards.
    pub top: f64,
}

impl Token {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
        }
    }
}

/// Horizontally adjacent tokens merged together.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Concatenated text.
    pub text: String,
    /// Leftmost edge.
    pub x0: f64,
    /// Rightmost edge.
    pub x1: f64,
}

impl Cell {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
        }
    }

    /// Digits without any letter, e.g. "1", "(50.62)", "30.09.2025".
    pub fn is_numeric(&self) -> bool {
        self.text.chars().any(|c| c.is_ascii_digit())
            && !self.text.chars().any(|c| c.is_alphabetic())
    }

    fn has_letters(&self) -> bool {
        self.text.chars().any(|c| c.is_alphabetic())
    }
}

/// Cells sharing a vertical position, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Vertical position of the row.
    pub top: f64,
    /// Cells ordered by `x0`.
    pub cells: Vec<Cell>,
}

impl Row {
    /// Cell texts joined with single spaces.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Raw leading label text.
    ///
    /// Numeric cells before any text are serial numbers and are skipped.
    /// The label ends at the first numeric cell after text, or at the first
    /// digit following a letter inside a mixed cell.
    pub fn raw_label(&self) -> String {
        self.split_label().0.trim().to_string()
    }

    /// Parts of the row that carry values, each with its cell's `x0`.
    ///
    /// Cells after the label are value cells. When the label ends inside a
    /// cell, the rest of that cell counts only if it holds no words or no
    /// value cell follows; words in it ("Rs 10 each") come before the values.
    pub fn value_parts(&self) -> Vec<(&str, f64)> {
        let (_, end, cut) = self.split_label();
        let Some(cut) = cut else {
            return self.cell_parts(end);
        };

        let cell = &self.cells[end];
        let tail = &cell.text[cut..];
        let rest = self.cell_parts(end + 1);

        if !tail.chars().any(char::is_alphabetic) {
            let mut parts = vec![(tail, cell.x0)];
            parts.extend(rest);
            parts
        } else if rest.iter().any(|(text, _)| has_digit(text)) {
            rest
        } else {
            vec![(after_words(tail), cell.x0)]
        }
    }

    fn cell_parts(&self, from: usize) -> Vec<(&str, f64)> {
        self.cells[from.min(self.cells.len())..]
            .iter()
            .map(|c| (c.text.as_str(), c.x0))
            .collect()
    }

    /// Label text, index of the cell where values may start and, when the
    /// label ends inside that cell, the byte offset of the cut.
    fn split_label(&self) -> (String, usize, Option<usize>) {
        let mut label = String::new();
        let mut seen_text = false;

        for (i, cell) in self.cells.iter().enumerate() {
            if cell.has_letters() {
                let cut = label_cut(&cell.text);
                if !label.is_empty() {
                    label.push(' ');
                }
                label.push_str(&cell.text[..cut]);
                seen_text = true;
                if cut < cell.text.len() {
                    return (label, i, Some(cut));
                }
            } else if cell.is_numeric() {
                if seen_text {
                    return (label, i, None);
                }
            } else {
                label.push_str(&cell.text);
            }
        }

        (label, self.cells.len(), None)
    }

    /// Normalized label used for keyword matching.
    pub fn label(&self) -> String {
        normalize_label(&self.raw_label())
    }
}

/// Byte index where the label part of `text` ends: the first digit that
/// follows a letter, or the end of the text.
fn label_cut(text: &str) -> usize {
    let mut seen_letter = false;
    for (i, c) in text.char_indices() {
        if c.is_alphabetic() {
            seen_letter = true;
        } else if seen_letter && (c.is_ascii_digit() || c == '(' && next_is_digit(text, i)) {
            return i;
        }
    }
    text.len()
}

fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Text after the last word of `text`, or all of it when nothing numeric
/// follows the words.
fn after_words(text: &str) -> &str {
    let end = text
        .char_indices()
        .filter(|(_, c)| c.is_alphabetic())
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    if has_digit(&text[end..]) {
        &text[end..]
    } else {
        text
    }
}

fn next_is_digit(text: &str, i: usize) -> bool {
    text[i + 1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Groups positioned tokens into rows and cells.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    row_tolerance: f64,
    cell_gap: f64,
}

impl RowBuilder {
    /// Create a builder with the given vertical tolerance and cell gap.
    pub fn new(row_tolerance: f64, cell_gap: f64) -> Self {
        Self {
            row_tolerance,
            cell_gap,
        }
    }

    /// Reconstruct rows from a page's tokens.
    ///
    /// Tokens are sorted top to bottom and folded into bands keyed by the
    /// first token's `top`; a token joins the latest band when within
    /// `row_tolerance` of it, otherwise it opens a new band.
    pub fn build(&self, tokens: &[Token]) -> Vec<Row> {
        let mut sorted: Vec<&Token> = tokens.iter().filter(|t| !t.text.trim().is_empty()).collect();
        sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

        let mut bands: Vec<(f64, Vec<&Token>)> = Vec::new();
        for token in sorted {
            match bands.last_mut() {
                Some((top, members)) if (token.top - *top).abs() < self.row_tolerance => {
                    members.push(token);
                }
                _ => bands.push((token.top, vec![token])),
            }
        }

        let rows: Vec<Row> = bands
            .into_iter()
            .map(|(top, members)| Row {
                top,
                cells: self.merge_cells(members),
            })
            .collect();

        trace!("Reconstructed {} rows from {} tokens", rows.len(), tokens.len());
        rows
    }

    fn merge_cells(&self, mut members: Vec<&Token>) -> Vec<Cell> {
        members.sort_by(|a, b| a.x0.total_cmp(&b.x0));

        let mut cells: Vec<Cell> = Vec::new();
        for token in members {
            let text = token.text.trim();
            match cells.last_mut() {
                Some(cell) if token.x0 - cell.x1 < self.cell_gap => {
                    if token.x0 - cell.x1 > TOUCHING_GAP {
                        cell.text.push(' ');
                    }
                    cell.text.push_str(text);
                    cell.x1 = cell.x1.max(token.x1);
                }
                _ => cells.push(Cell::new(text, token.x0, token.x1)),
            }
        }
        cells
    }
}

/// Rows from a pre-grouped table; column `k` is placed at `k * pitch`.
pub fn rows_from_grid(table: &[Vec<String>], pitch: f64) -> Vec<Row> {
    table
        .iter()
        .enumerate()
        .filter_map(|(r, row)| {
            let cells: Vec<Cell> = row
                .iter()
                .enumerate()
                .filter_map(|(k, text)| {
                    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    if text.is_empty() {
                        return None;
                    }
                    let x0 = k as f64 * pitch;
                    Some(Cell::new(text, x0, x0 + pitch * 0.9))
                })
                .collect();
            (!cells.is_empty()).then_some(Row {
                top: r as f64,
                cells,
            })
        })
        .collect()
}

/// One single-cell row per non-empty line of plain text.
pub fn rows_from_text(text: &str) -> Vec<Row> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| Row {
            top: i as f64,
            cells: vec![Cell::new(line, 0.0, 0.0)],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tok(text: &str, x0: f64, x1: f64, top: f64) -> Token {
        Token::new(text, x0, x1, top)
    }

    #[test]
    fn test_empty_tokens_yield_no_rows() {
        let builder = RowBuilder::new(5.0, 4.0);
        assert!(builder.build(&[]).is_empty());
    }

    #[test]
    fn test_groups_rows_within_tolerance() {
        let builder = RowBuilder::new(5.0, 4.0);
        let tokens = vec![
            tok("1,042.30", 400.0, 440.0, 101.5),
            tok("Revenue", 20.0, 60.0, 100.0),
            tok("1,119.18", 300.0, 340.0, 102.0),
            tok("Other", 20.0, 45.0, 115.0),
        ];

        let rows = builder.build(&tokens);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(), "Revenue 1,119.18 1,042.30");
        assert_eq!(rows[1].text(), "Other");
    }

    #[test]
    fn test_band_representative_does_not_drift() {
        let builder = RowBuilder::new(5.0, 4.0);
        let tokens = vec![
            tok("a", 0.0, 5.0, 100.0),
            tok("b", 50.0, 55.0, 104.0),
            tok("c", 100.0, 105.0, 108.0),
        ];

        let rows = builder.build(&tokens);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[1].top, 108.0);
    }

    #[test]
    fn test_merges_split_number() {
        let builder = RowBuilder::new(5.0, 4.0);
        let tokens = vec![
            tok("1,1", 300.0, 310.0, 50.0),
            tok("19.18", 310.2, 330.0, 50.0),
            tok("Net", 20.0, 35.0, 50.0),
            tok("Sales", 37.5, 60.0, 50.0),
        ];

        let rows = builder.build(&tokens);
        assert_eq!(
            rows[0].cells,
            vec![
                Cell::new("Net Sales", 20.0, 60.0),
                Cell::new("1,119.18", 300.0, 330.0),
            ]
        );
    }

    #[test]
    fn test_label_skips_serial_number() {
        let row = Row {
            top: 0.0,
            cells: vec![
                Cell::new("1", 10.0, 15.0),
                Cell::new("Revenue from Operations", 30.0, 150.0),
                Cell::new("25", 200.0, 210.0),
                Cell::new("6171.59", 300.0, 340.0),
            ],
        };
        assert_eq!(row.label(), "revenuefromoperations");
    }

    #[test]
    fn test_label_of_single_line_row() {
        let rows = rows_from_text("Profit before tax (3-4) 169.40 150.22\n\n  Basic EPS 0.70 ");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].raw_label(), "Profit before tax");
        assert_eq!(rows[1].label(), "basiceps");
    }

    #[test]
    fn test_value_parts_exclude_label_numbers() {
        let row = Row {
            top: 0.0,
            cells: vec![
                Cell::new("Basic EPS (Face value Rs 10 each)", 20.0, 180.0),
                Cell::new("49.93", 300.0, 330.0),
            ],
        };
        assert_eq!(row.label(), "basicepsfacevaluers");
        assert_eq!(row.value_parts(), vec![("49.93", 300.0)]);

        let row = Row {
            top: 0.0,
            cells: vec![
                Cell::new("1", 10.0, 15.0),
                Cell::new("Revenue from Operations", 30.0, 150.0),
                Cell::new("6171.59", 300.0, 340.0),
            ],
        };
        assert_eq!(row.value_parts(), vec![("6171.59", 300.0)]);
    }

    #[test]
    fn test_value_parts_of_single_line_rows() {
        let rows = rows_from_text(
            "1 Revenue from Operations 25 6171.59\nBasic EPS (Face value Rs 10 each) 49.93\nNet Profit 120.50 Cr",
        );
        assert_eq!(rows[0].value_parts(), vec![("25 6171.59", 0.0)]);
        assert_eq!(rows[1].value_parts(), vec![(") 49.93", 0.0)]);
        assert_eq!(rows[2].value_parts(), vec![("120.50 Cr", 0.0)]);
    }

    #[test]
    fn test_rows_from_grid_positions() {
        let table = vec![
            vec!["Particulars".to_string(), "30.09.2025".to_string(), "".to_string()],
            vec![],
            vec!["Net Profit".to_string(), "(50.62)".to_string(), "12.1".to_string()],
        ];

        let rows = rows_from_grid(&table, 100.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[1].cells[2].x0, 200.0);
        assert_eq!(rows[1].label(), "netprofit");
    }
}
