//! Financial metric data models.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Identity of an extracted figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    /// Revenue from operations.
    Sales,
    /// Total income (revenue plus other income). Only used as a Sales fallback.
    TotalIncome,
    /// Total expenses.
    Expenses,
    /// Other (non-operating) income.
    OtherIncome,
    /// Depreciation and amortisation.
    Depreciation,
    /// Finance costs / interest.
    FinanceCost,
    /// Profit before tax.
    Pbt,
    /// Profit after tax.
    Pat,
    /// Basic earnings per share.
    Eps,
    /// PBT + finance cost + depreciation - other income.
    OperatingProfit,
    /// Operating profit as a percentage of sales.
    OperatingMargin,
}

impl MetricKey {
    /// Display name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKey::Sales => "Sales",
            MetricKey::TotalIncome => "TotalIncome",
            MetricKey::Expenses => "Expenses",
            MetricKey::OtherIncome => "OtherIncome",
            MetricKey::Depreciation => "Depreciation",
            MetricKey::FinanceCost => "FinanceCost",
            MetricKey::Pbt => "PBT",
            MetricKey::Pat => "PAT",
            MetricKey::Eps => "EPS",
            MetricKey::OperatingProfit => "OperatingProfit",
            MetricKey::OperatingMargin => "OperatingMargin%",
        }
    }

    /// Helper metrics feed derived values but never appear in the record.
    pub fn is_helper(&self) -> bool {
        matches!(
            self,
            MetricKey::TotalIncome
                | MetricKey::OtherIncome
                | MetricKey::Depreciation
                | MetricKey::FinanceCost
        )
    }

    /// Derived metrics are computed, never read from a row.
    pub fn is_derived(&self) -> bool {
        matches!(self, MetricKey::OperatingProfit | MetricKey::OperatingMargin)
    }

    /// Per-share figures are not expressed in the statement's aggregate unit.
    pub fn is_per_share(&self) -> bool {
        matches!(self, MetricKey::Eps)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a statement covers the group or the filing entity alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementMode {
    /// Figures include subsidiaries.
    Consolidated,
    /// Figures of the filing entity only.
    Standalone,
}

impl StatementMode {
    /// Lower-case marker word searched for in page text.
    pub fn marker(&self) -> &'static str {
        match self {
            StatementMode::Consolidated => "consolidated",
            StatementMode::Standalone => "standalone",
        }
    }

    /// The opposite mode.
    pub fn other(&self) -> StatementMode {
        match self {
            StatementMode::Consolidated => StatementMode::Standalone,
            StatementMode::Standalone => StatementMode::Consolidated,
        }
    }
}

impl fmt::Display for StatementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementMode::Consolidated => f.write_str("Consolidated"),
            StatementMode::Standalone => f.write_str("Standalone"),
        }
    }
}

/// Evidentiary pass that produced a value, weakest first.
///
/// `*Fallback` variants mark values chosen by the first-significant-token
/// heuristic instead of the anchor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Computed from other metrics or recovered from free text.
    Derived,
    /// Standalone page, no anchor column.
    StandaloneFallback,
    /// Standalone page, anchor column.
    Standalone,
    /// Consolidated page, no anchor column.
    ConsolidatedFallback,
    /// Consolidated page, anchor column.
    Consolidated,
}

impl Priority {
    /// Priority for a row read from a page of the given mode.
    pub fn for_page(mode: StatementMode, anchored: bool) -> Self {
        match (mode, anchored) {
            (StatementMode::Consolidated, true) => Priority::Consolidated,
            (StatementMode::Consolidated, false) => Priority::ConsolidatedFallback,
            (StatementMode::Standalone, true) => Priority::Standalone,
            (StatementMode::Standalone, false) => Priority::StandaloneFallback,
        }
    }
}

/// A resolved metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Value after scaling, rounded to 2 decimals.
    pub value: f64,
    /// Divisor that was applied to the raw figure.
    pub scale: f64,
    /// Pass that produced the value.
    pub priority: Priority,
    /// Keyword rank of the matching label (lower is stronger).
    pub rank: u8,
    /// Page the value was read from (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl MetricValue {
    /// A computed value.
    pub fn derived(value: f64) -> Self {
        Self {
            value: round2(value),
            scale: 1.0,
            priority: Priority::Derived,
            rank: u8::MAX,
            page: None,
        }
    }
}

/// Overall outcome for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Sales, PBT and PAT all resolved.
    Success,
    /// Some of Sales, PBT and PAT resolved.
    Partial,
    /// None resolved.
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("Success"),
            Status::Partial => f.write_str("Partial"),
            Status::Failed => f.write_str("Failed"),
        }
    }
}

/// Result of statement extraction for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Company (usually the file stem).
    pub company: String,
    /// Statement mode the document was read in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<StatementMode>,
    /// Resolved metrics, helpers included.
    pub metrics: BTreeMap<MetricKey, MetricValue>,
    /// Pages rows were read from (1-indexed).
    pub pages: Vec<u32>,
    /// Overall outcome.
    pub status: Status,
    /// Recovered problems worth reporting.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// A result with every metric absent.
    pub fn empty() -> Self {
        Self {
            company: String::new(),
            mode: None,
            metrics: BTreeMap::new(),
            pages: Vec::new(),
            status: Status::Failed,
            warnings: Vec::new(),
            processing_time_ms: 0,
        }
    }

    /// Set the company name.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// Value of a metric, 0.0 when unresolved.
    pub fn value(&self, key: MetricKey) -> f64 {
        self.metrics.get(&key).map(|m| m.value).unwrap_or(0.0)
    }

    /// Flat record exposed to downstream consumers.
    pub fn record(&self) -> MetricsRecord {
        MetricsRecord {
            company: self.company.clone(),
            sales: self.value(MetricKey::Sales),
            expenses: self.value(MetricKey::Expenses),
            operating_profit: self.value(MetricKey::OperatingProfit),
            operating_margin: self.value(MetricKey::OperatingMargin),
            pbt: self.value(MetricKey::Pbt),
            pat: self.value(MetricKey::Pat),
            eps: self.value(MetricKey::Eps),
        }
    }

    /// Classify the outcome from the headline metrics.
    pub fn compute_status(&self) -> Status {
        let headline = [MetricKey::Sales, MetricKey::Pbt, MetricKey::Pat];
        let resolved = headline.iter().filter(|k| self.value(**k) != 0.0).count();
        match resolved {
            3 => Status::Success,
            0 => Status::Failed,
            _ => Status::Partial,
        }
    }
}

/// The flat per-document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Sales")]
    pub sales: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
    #[serde(rename = "OperatingProfit")]
    pub operating_profit: f64,
    #[serde(rename = "OperatingMargin%")]
    pub operating_margin: f64,
    #[serde(rename = "PBT")]
    pub pbt: f64,
    #[serde(rename = "PAT")]
    pub pat: f64,
    #[serde(rename = "EPS")]
    pub eps: f64,
}

impl MetricsRecord {
    /// Column names in record order.
    pub const HEADERS: [&'static str; 8] = [
        "Company",
        "Sales",
        "Expenses",
        "OperatingProfit",
        "OperatingMargin%",
        "PBT",
        "PAT",
        "EPS",
    ];

    /// Numeric fields formatted with two decimals, in record order.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![self.company.clone()];
        row.extend(
            [
                self.sales,
                self.expenses,
                self.operating_profit,
                self.operating_margin,
                self.pbt,
                self.pat,
                self.eps,
            ]
            .iter()
            .map(|v| format!("{:.2}", v)),
        );
        row
    }
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    let rounded = Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0);
    // Avoid printing "-0.00".
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(-0.5062), -0.51);
        assert_eq!(round2(1119.18), 1119.18);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.001), 0.0);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_priority_order() {
        assert!(Priority::Consolidated > Priority::ConsolidatedFallback);
        assert!(Priority::ConsolidatedFallback > Priority::Standalone);
        assert!(Priority::StandaloneFallback > Priority::Derived);
        assert_eq!(
            Priority::for_page(StatementMode::Standalone, true),
            Priority::Standalone
        );
    }

    #[test]
    fn test_status_from_headline_metrics() {
        let mut result = ExtractionResult::empty();
        assert_eq!(result.compute_status(), Status::Failed);

        result.metrics.insert(MetricKey::Sales, MetricValue::derived(10.0));
        assert_eq!(result.compute_status(), Status::Partial);

        result.metrics.insert(MetricKey::Pbt, MetricValue::derived(2.0));
        result.metrics.insert(MetricKey::Pat, MetricValue::derived(-1.0));
        assert_eq!(result.compute_status(), Status::Success);
    }

    #[test]
    fn test_record_hides_helpers() {
        let mut result = ExtractionResult::empty().with_company("acme");
        result.metrics.insert(MetricKey::OtherIncome, MetricValue::derived(5.0));
        result.metrics.insert(MetricKey::Eps, MetricValue::derived(12.5));

        let record = result.record();
        assert_eq!(record.company, "acme");
        assert_eq!(record.eps, 12.5);
        assert_eq!(record.sales, 0.0);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("OperatingMargin%").is_some());
        assert!(json.get("OtherIncome").is_none());
        assert_eq!(record.to_row()[7], "12.50");
    }
}
