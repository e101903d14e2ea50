//! Page layout reconstruction: positioned tokens to rows of cells.

mod rows;

pub use rows::{rows_from_grid, rows_from_text, Cell, Row, RowBuilder, Token};

/// How the rows of a page were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// Clustered from positioned tokens.
    Positioned,
    /// Taken from a pre-grouped table grid.
    Grid,
    /// One row per text line; column positions are lost.
    Text,
}

impl RowLayout {
    /// Whether cell positions are meaningful for column alignment.
    pub fn has_columns(&self) -> bool {
        !matches!(self, RowLayout::Text)
    }
}

/// Rows of one page together with how they were built.
#[derive(Debug, Clone)]
pub struct PageRows {
    /// Rows ordered top to bottom.
    pub rows: Vec<Row>,
    /// Source of the rows.
    pub layout: RowLayout,
}

/// Lower-case and strip everything but ASCII letters and digits.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
