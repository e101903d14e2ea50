//! Rule-based building blocks for results statements.

pub mod keywords;
pub mod numbers;
pub mod patterns;
pub mod period;
pub mod scale;

pub use keywords::{Classification, KeywordPattern, KeywordTable, MetricRule};
pub use numbers::{numbers_in, parse_amount, row_numbers, NumericToken};
pub use period::{discover_anchor, infer_reporting_year, Anchor};
pub use scale::{detect_unit, Scale, ScaleDetector, ScaleSource, Unit};
