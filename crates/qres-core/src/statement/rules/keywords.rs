//! Declarative keyword table mapping row labels to metrics.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::MetricKey;

/// Version of the built-in keyword table.
pub const KEYWORD_TABLE_VERSION: u32 = 1;

/// A substring matched against normalized labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordPattern {
    /// Normalized substring.
    pub pattern: String,
    /// Strength of the match; lower wins.
    #[serde(default = "default_rank")]
    pub rank: u8,
    /// Labels containing any of these are rejected for this pattern.
    #[serde(default)]
    pub exclusions: Vec<String>,
}

fn default_rank() -> u8 {
    1
}

impl KeywordPattern {
    fn new(pattern: &str, rank: u8, exclusions: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            rank,
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, label: &str) -> bool {
        label.contains(&self.pattern) && !self.exclusions.iter().any(|e| label.contains(e.as_str()))
    }
}

/// Patterns for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    /// Metric the rule resolves.
    pub key: MetricKey,
    /// Candidate patterns.
    pub patterns: Vec<KeywordPattern>,
    /// Words the label must contain for any pattern to apply.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl MetricRule {
    fn new(key: MetricKey, patterns: Vec<KeywordPattern>) -> Self {
        Self {
            key,
            patterns,
            requires: Vec::new(),
        }
    }

    fn requiring(mut self, words: &[&str]) -> Self {
        self.requires = words.iter().map(|s| s.to_string()).collect();
        self
    }

    fn best_match(&self, label: &str) -> Option<&KeywordPattern> {
        if !self.requires.iter().all(|w| label.contains(w.as_str())) {
            return None;
        }
        self.patterns
            .iter()
            .filter(|p| p.matches(label))
            .min_by_key(|p| p.rank)
    }
}

/// Result of classifying a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Matched metric.
    pub key: MetricKey,
    /// Rank of the matching pattern.
    pub rank: u8,
    /// The pattern that matched.
    pub pattern: String,
}

/// Ordered metric rules. Rules are tried in order and the first metric
/// with a non-excluded matching pattern wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    /// Table version.
    pub version: u32,
    /// Rules in matching order.
    pub rules: Vec<MetricRule>,
}

impl KeywordTable {
    /// Classify a normalized label.
    pub fn classify(&self, label: &str) -> Option<Classification> {
        if label.is_empty() {
            return None;
        }

        let found = self.rules.iter().find_map(|rule| {
            rule.best_match(label).map(|p| Classification {
                key: rule.key,
                rank: p.rank,
                pattern: p.pattern.clone(),
            })
        });

        if let Some(c) = &found {
            trace!("Label '{}' -> {} via '{}'", label, c.key, c.pattern);
        }
        found
    }

    /// Rule for a metric, if the table has one.
    pub fn rule(&self, key: MetricKey) -> Option<&MetricRule> {
        self.rules.iter().find(|r| r.key == key)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        let p = KeywordPattern::new;
        let pat_excl = ["comprehensive", "minority", "attributable", "before"];
        let eps_excl = ["capital", "reserve", "paidup"];
        let finance_excl = ["income", "before", "controlling", "minority", "share"];

        let rules = vec![
            MetricRule::new(
                MetricKey::Sales,
                vec![
                    p("revenuefromoperations", 1, &[]),
                    p("totalrevenuefrom", 1, &[]),
                    p("incomefromoperations", 2, &[]),
                    p("netsales", 3, &[]),
                ],
            ),
            MetricRule::new(MetricKey::TotalIncome, vec![p("totalincome", 1, &[])]),
            MetricRule::new(
                MetricKey::Expenses,
                vec![p("totalexpenses", 1, &[]), p("totalexpenditure", 1, &[])],
            ),
            MetricRule::new(
                MetricKey::Pbt,
                vec![
                    p("profitbeforetax", 1, &[]),
                    p("profitlossbeforetax", 1, &[]),
                    p("profitbeforeexceptional", 3, &[]),
                    p("profitlossbeforeexceptional", 3, &[]),
                    p("pbt", 2, &[]),
                ],
            ),
            MetricRule::new(
                MetricKey::Pat,
                vec![
                    p("netprofit", 1, &pat_excl),
                    p("profitaftertax", 1, &pat_excl),
                    p("profitfortheperiod", 1, &pat_excl),
                    p("profitlossfortheperiod", 1, &pat_excl),
                    p("netprofitlossfortheperiod", 1, &pat_excl),
                ],
            ),
            MetricRule::new(
                MetricKey::Eps,
                vec![
                    p("earningspershare", 1, &eps_excl),
                    p("earningpershare", 1, &eps_excl),
                    p("eps", 2, &eps_excl),
                    p("basic", 3, &eps_excl),
                ],
            )
            .requiring(&["basic"]),
            MetricRule::new(MetricKey::Depreciation, vec![p("depreciation", 1, &["before"])]),
            MetricRule::new(
                MetricKey::FinanceCost,
                vec![
                    p("financecost", 1, &finance_excl),
                    p("interestcost", 2, &finance_excl),
                    p("interest", 3, &finance_excl),
                ],
            ),
            MetricRule::new(
                MetricKey::OtherIncome,
                vec![p("otherincome", 1, &["total", "comprehensive"])],
            ),
        ];

        Self {
            version: KEYWORD_TABLE_VERSION,
            rules,
        }
    }
}
