//! Results statement extraction pipeline.

pub mod aggregator;
pub mod disambiguator;
mod parser;
pub mod rules;
pub mod selector;

pub use aggregator::MetricAggregator;
pub use disambiguator::{Pick, ValueDisambiguator};
pub use parser::{Inspection, PageReport, RowReport, StatementExtractor, StatementParser};
pub use selector::{PageScore, PageSelection, PageSelector};
