//! Core library for quarterly financial-result extraction.
//!
//! This crate provides:
//! - Token sources (PDF via lopdf/pdf-extract, JSON page dumps)
//! - Row and cell reconstruction from positioned tokens
//! - Results page selection, unit detection and label classification
//! - Metric aggregation with derived operating profit and margin

pub mod error;
pub mod layout;
pub mod models;
pub mod pdf;
pub mod statement;

pub use error::{ExtractionError, PdfError, QresError, Result};
pub use layout::{Cell, Row, RowBuilder, Token};
pub use models::{
    ExtractionResult, MetricKey, MetricValue, MetricsRecord, ModePreference, Priority, QresConfig,
    StatementMode, Status, ValueStrategy,
};
pub use pdf::{DumpSource, PdfExtractor, TokenSource};
pub use statement::{StatementExtractor, StatementParser};
