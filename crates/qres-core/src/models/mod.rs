//! Data models for extraction results and configuration.

pub mod config;
pub mod metrics;

pub use config::{ExtractionConfig, ModePreference, PdfConfig, QresConfig, SelectorWeights, ValueStrategy};
pub use metrics::{
    round2, ExtractionResult, MetricKey, MetricValue, MetricsRecord, Priority, StatementMode, Status,
};
