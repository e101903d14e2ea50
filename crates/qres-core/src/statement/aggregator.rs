//! Per-document metric accumulation and derived metrics.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::models::{ExtractionResult, MetricKey, MetricValue};

/// Accumulates candidate values for one document.
///
/// A value is only replaced by a strictly higher priority, or, at equal
/// priority on the same page, by a strictly stronger keyword rank.
#[derive(Debug, Clone, Default)]
pub struct MetricAggregator {
    metrics: BTreeMap<MetricKey, MetricValue>,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate. Returns whether it was stored.
    pub fn offer(&mut self, key: MetricKey, candidate: MetricValue) -> bool {
        if key.is_derived() || candidate.value == 0.0 {
            return false;
        }

        let replace = match self.metrics.get(&key) {
            None => true,
            Some(current) => {
                candidate.priority > current.priority
                    || (candidate.priority == current.priority
                        && candidate.page == current.page
                        && candidate.rank < current.rank)
            }
        };

        if replace {
            trace!("{} = {} ({:?}, rank {})", key, candidate.value, candidate.priority, candidate.rank);
            self.metrics.insert(key, candidate);
        }
        replace
    }

    /// Current value of a metric.
    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.metrics.get(&key)
    }

    /// Whether a metric has a value.
    pub fn has(&self, key: MetricKey) -> bool {
        self.metrics.contains_key(&key)
    }

    fn value(&self, key: MetricKey) -> f64 {
        self.metrics.get(&key).map(|m| m.value).unwrap_or(0.0)
    }

    /// Apply sanity checks and derived metrics, then store everything in
    /// `result` and set its status.
    pub fn finalize_into(mut self, result: &mut ExtractionResult) {
        let sales = self.value(MetricKey::Sales);
        let other_income = self.value(MetricKey::OtherIncome);
        if self.has(MetricKey::Sales) && other_income > sales {
            result
                .warnings
                .push(format!("OtherIncome {} exceeds Sales {}; ignored", other_income, sales));
            self.metrics.remove(&MetricKey::OtherIncome);
        }

        if !self.has(MetricKey::Sales) {
            self.derive_sales(result);
        }

        let inputs = [
            MetricKey::Pbt,
            MetricKey::FinanceCost,
            MetricKey::Depreciation,
            MetricKey::OtherIncome,
        ];
        if inputs.iter().any(|k| self.has(*k)) {
            let operating_profit = self.value(MetricKey::Pbt)
                + self.value(MetricKey::FinanceCost)
                + self.value(MetricKey::Depreciation)
                - self.value(MetricKey::OtherIncome);
            let sales = self.value(MetricKey::Sales);
            let margin = if sales == 0.0 {
                0.0
            } else {
                operating_profit / sales * 100.0
            };

            self.metrics
                .insert(MetricKey::OperatingProfit, MetricValue::derived(operating_profit));
            self.metrics
                .insert(MetricKey::OperatingMargin, MetricValue::derived(margin));
        }

        result.metrics = self.metrics;
        result.status = result.compute_status();
        debug!("Finalized {} metrics, status {}", result.metrics.len(), result.status);
    }

    fn derive_sales(&mut self, result: &mut ExtractionResult) {
        let other_income = self.value(MetricKey::OtherIncome);

        let (sales, source) = if self.has(MetricKey::TotalIncome) {
            (self.value(MetricKey::TotalIncome) - other_income, "TotalIncome - OtherIncome")
        } else if self.has(MetricKey::Pbt) && self.has(MetricKey::Expenses) {
            (
                self.value(MetricKey::Pbt) + self.value(MetricKey::Expenses) - other_income,
                "PBT + Expenses - OtherIncome",
            )
        } else {
            return;
        };

        let derived = MetricValue::derived(sales);
        if derived.value != 0.0 {
            result.warnings.push(format!("Sales derived as {}", source));
            self.metrics.insert(MetricKey::Sales, derived);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};

    fn value(value: f64, priority: Priority, rank: u8, page: u32) -> MetricValue {
        MetricValue {
            value,
            scale: 1.0,
            priority,
            rank,
            page: Some(page),
        }
    }

    #[test]
    fn test_higher_priority_wins() {
        let mut agg = MetricAggregator::new();
        assert!(agg.offer(MetricKey::Pat, value(10.0, Priority::Consolidated, 1, 3)));
        assert!(!agg.offer(MetricKey::Pat, value(99.0, Priority::Standalone, 1, 2)));
        assert!(!agg.offer(MetricKey::Pat, value(99.0, Priority::ConsolidatedFallback, 1, 3)));
        assert_eq!(agg.get(MetricKey::Pat).unwrap().value, 10.0);

        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::Pat, value(99.0, Priority::StandaloneFallback, 1, 2));
        assert!(agg.offer(MetricKey::Pat, value(10.0, Priority::Consolidated, 1, 3)));
        assert_eq!(agg.get(MetricKey::Pat).unwrap().value, 10.0);
    }

    #[test]
    fn test_first_non_zero_wins_within_priority() {
        let mut agg = MetricAggregator::new();
        assert!(!agg.offer(MetricKey::Sales, value(0.0, Priority::Standalone, 1, 1)));
        assert!(agg.offer(MetricKey::Sales, value(5.0, Priority::Standalone, 1, 1)));
        assert!(!agg.offer(MetricKey::Sales, value(7.0, Priority::Standalone, 1, 1)));
    }

    #[test]
    fn test_stronger_rank_on_same_page_replaces() {
        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::Pbt, value(90.0, Priority::Standalone, 3, 2));
        assert!(agg.offer(MetricKey::Pbt, value(80.0, Priority::Standalone, 1, 2)));
        assert!(!agg.offer(MetricKey::Pbt, value(70.0, Priority::Standalone, 0, 4)));
        assert_eq!(agg.get(MetricKey::Pbt).unwrap().value, 80.0);
    }

    #[test]
    fn test_derived_keys_not_offered() {
        let mut agg = MetricAggregator::new();
        assert!(!agg.offer(MetricKey::OperatingProfit, MetricValue::derived(1.0)));
    }

    #[test]
    fn test_operating_profit_and_margin() {
        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::Sales, value(200.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::Pbt, value(40.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::Pat, value(30.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::FinanceCost, value(5.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::Depreciation, value(10.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::OtherIncome, value(3.0, Priority::Standalone, 1, 1));

        let mut result = ExtractionResult::empty();
        agg.finalize_into(&mut result);

        assert_eq!(result.value(MetricKey::OperatingProfit), 52.0);
        assert_eq!(result.value(MetricKey::OperatingMargin), 26.0);
        assert_eq!(result.status, Status::Success);
    }

    #[test]
    fn test_margin_zero_without_sales() {
        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::Pbt, value(40.0, Priority::Standalone, 1, 1));

        let mut result = ExtractionResult::empty();
        agg.finalize_into(&mut result);

        assert_eq!(result.value(MetricKey::Sales), 0.0);
        assert_eq!(result.value(MetricKey::OperatingProfit), 40.0);
        assert_eq!(result.value(MetricKey::OperatingMargin), 0.0);
        assert_eq!(result.status, Status::Partial);
    }

    #[test]
    fn test_other_income_above_sales_zeroed() {
        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::Sales, value(100.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::OtherIncome, value(2024.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::Pbt, value(20.0, Priority::Standalone, 1, 1));

        let mut result = ExtractionResult::empty();
        agg.finalize_into(&mut result);

        assert_eq!(result.value(MetricKey::OtherIncome), 0.0);
        assert_eq!(result.value(MetricKey::OperatingProfit), 20.0);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_sales_fallbacks() {
        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::TotalIncome, value(120.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::OtherIncome, value(20.0, Priority::Standalone, 1, 1));
        let mut result = ExtractionResult::empty();
        agg.finalize_into(&mut result);
        assert_eq!(result.value(MetricKey::Sales), 100.0);
        assert_eq!(result.metrics[&MetricKey::Sales].priority, Priority::Derived);

        let mut agg = MetricAggregator::new();
        agg.offer(MetricKey::Pbt, value(15.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::Expenses, value(90.0, Priority::Standalone, 1, 1));
        agg.offer(MetricKey::OtherIncome, value(5.0, Priority::Standalone, 1, 1));
        let mut result = ExtractionResult::empty();
        agg.finalize_into(&mut result);
        assert_eq!(result.value(MetricKey::Sales), 100.0);
    }

    #[test]
    fn test_empty_aggregator_fails() {
        let mut result = ExtractionResult::empty();
        MetricAggregator::new().finalize_into(&mut result);
        assert!(result.metrics.is_empty());
        assert_eq!(result.status, Status::Failed);
    }
}
