//! Error types for the qres-core library.

use thiserror::Error;

/// Main error type for the qres library.
#[derive(Error, Debug)]
pub enum QresError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Statement extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Page dump could not be decoded.
    #[error("dump error: {0}")]
    Dump(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by token sources while decoding a document.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text or glyph positions from the PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors local to the extraction pipeline.
///
/// None of these abort a document: they are recovered where they occur and
/// surface as warnings, skipped tokens or lower priorities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// No page qualified as a results statement.
    #[error("no results statement page found")]
    NoTargetPage,

    /// A cell fragment looked numeric but did not parse.
    #[error("unparsable numeric token: {0}")]
    UnparsableToken(String),

    /// Several candidate values and no anchor column to choose between them.
    #[error("ambiguous value for {metric} on page {page}: {candidates} candidates, no anchor column")]
    AmbiguousValue {
        metric: String,
        page: u32,
        candidates: usize,
    },

    /// A value was found but failed a sanity check.
    #[error("discarded {metric} value {value}: {reason}")]
    Implausible {
        metric: String,
        value: f64,
        reason: String,
    },
}

/// Result type for the qres library.
pub type Result<T> = std::result::Result<T, QresError>;
