//! Token sources: PDF decoding and JSON page dumps.

mod dump;
mod extractor;

pub use dump::{DumpPage, DumpSource};
pub use extractor::PdfExtractor;

use crate::error::PdfError;
use crate::layout::Token;

/// Result type for token source operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A pre-grouped table: rows of cell texts.
pub type Table = Vec<Vec<String>>;

/// Supplies per-page text, positioned tokens and optional tables.
///
/// Pages are 1-indexed.
pub trait TokenSource {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Plain text of a page.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Positioned tokens of a page. Empty when positions are unavailable.
    fn page_tokens(&self, page: u32) -> Result<Vec<Token>>;

    /// Pre-grouped tables of a page, if the source has any.
    fn page_tables(&self, _page: u32) -> Result<Vec<Table>> {
        Ok(Vec::new())
    }

    /// Check a page number against the page count.
    fn check_page(&self, page: u32) -> Result<()> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        Ok(())
    }
}
