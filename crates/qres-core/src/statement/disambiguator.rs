//! Picks the target-period value among a row's numbers.

use tracing::trace;

use super::rules::{NumericToken, Scale};
use crate::error::ExtractionError;
use crate::models::{round2, ExtractionConfig, MetricKey, ValueStrategy};

/// A value chosen from a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// Raw value as printed.
    pub value: f64,
    /// Chosen by column alignment rather than the first-token fallback.
    pub anchored: bool,
    /// Candidate tokens after serial numbers were dropped.
    pub candidates: usize,
}

/// Value selection and normalization for classified rows.
#[derive(Debug, Clone)]
pub struct ValueDisambiguator {
    small_integer_ceiling: f64,
    serial_positions: usize,
    significant_floor: f64,
    anchor_max_distance: f64,
    eps_ceiling: f64,
    strategy: ValueStrategy,
}

impl ValueDisambiguator {
    /// Build from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            small_integer_ceiling: config.small_integer_ceiling,
            serial_positions: config.serial_positions,
            significant_floor: config.significant_floor,
            anchor_max_distance: config.anchor_max_distance,
            eps_ceiling: config.eps_ceiling,
            strategy: config.strategy,
        }
    }

    /// Override the selection strategy.
    pub fn with_strategy(mut self, strategy: ValueStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Drop small integers in leading positions (serial and note numbers).
    ///
    /// Rows with two or fewer tokens are left untouched.
    pub fn drop_serials(&self, tokens: &[NumericToken]) -> Vec<NumericToken> {
        if tokens.len() <= 2 {
            return tokens.to_vec();
        }
        tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| {
                !(*i < self.serial_positions && t.integral && t.value.abs() < self.small_integer_ceiling)
            })
            .map(|(_, t)| *t)
            .collect()
    }

    /// Choose the value of the target period.
    pub fn pick(&self, tokens: &[NumericToken], anchor: Option<f64>, key: MetricKey) -> Option<Pick> {
        let tokens = self.drop_serials(tokens);
        let candidates = tokens.len();

        if self.strategy == ValueStrategy::Anchored {
            if let Some(anchor) = anchor {
                let nearest = tokens
                    .iter()
                    .min_by(|a, b| (a.x0 - anchor).abs().total_cmp(&(b.x0 - anchor).abs()));
                if let Some(t) = nearest.filter(|t| (t.x0 - anchor).abs() < self.anchor_max_distance) {
                    trace!("{}: {} aligned with anchor {:.1}", key, t.value, anchor);
                    return Some(Pick {
                        value: t.value,
                        anchored: true,
                        candidates,
                    });
                }
            }
        }

        let first = if key.is_per_share() {
            tokens.first()
        } else {
            tokens
                .iter()
                .find(|t| t.value.abs() > self.significant_floor || !t.integral)
        };

        first.map(|t| Pick {
            value: t.value,
            anchored: false,
            candidates,
        })
    }

    /// Scale and round a picked value.
    ///
    /// Per-share figures are never scaled; EPS above the ceiling is a mis-parse.
    pub fn normalize(&self, pick: &Pick, key: MetricKey, scale: &Scale) -> Result<f64, ExtractionError> {
        if key.is_per_share() {
            if pick.value.abs() > self.eps_ceiling {
                return Err(ExtractionError::Implausible {
                    metric: key.name().to_string(),
                    value: pick.value,
                    reason: format!("exceeds EPS ceiling {}", self.eps_ceiling),
                });
            }
            return Ok(round2(pick.value));
        }
        Ok(round2(pick.value / scale.divisor()))
    }
}

impl Default for ValueDisambiguator {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}
