//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::statement::rules::keywords::KeywordTable;

/// Main configuration for the qres pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QresConfig {
    /// Token source configuration.
    pub pdf: PdfConfig,

    /// Extraction tolerances and policies.
    pub extraction: ExtractionConfig,

    /// Metric keyword table.
    pub keywords: KeywordTable,
}

/// Token source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Password tried on encrypted documents.
    pub password: String,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Use pre-grouped tables from the source when it supplies them.
    pub prefer_tables: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            password: String::new(),
            max_pages: 0,
            prefer_tables: true,
        }
    }
}

/// Which statement to read when a document carries both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePreference {
    /// Consolidated if the leading pages mention it, else standalone.
    #[default]
    Auto,
    /// Always read consolidated figures.
    Consolidated,
    /// Always read standalone figures.
    Standalone,
}

/// How a value is picked among a row's numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStrategy {
    /// Column closest to the reporting-period header, first significant token otherwise.
    #[default]
    Anchored,
    /// Always the first significant token.
    FirstToken,
}

/// Page scoring weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorWeights {
    /// Page contains "particulars".
    pub particulars: i32,
    /// Page contains a revenue keyword.
    pub revenue: i32,
    /// Page contains "expenses" or "expenditure".
    pub expenses: i32,
    /// Page mentions the document mode.
    pub mode_match: i32,
    /// Page is explicitly the other mode while consolidated figures are wanted.
    pub other_mode_penalty: i32,
    /// Page is an auditor's review report.
    pub auditor_penalty: i32,
    /// Page carries segment information.
    pub segment_penalty: i32,
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            particulars: 10,
            revenue: 5,
            expenses: 5,
            mode_match: 10,
            other_mode_penalty: 10,
            auditor_penalty: 15,
            segment_penalty: 15,
        }
    }
}

/// Extraction tolerances and policies.
///
/// The distance and magnitude thresholds are empirical calibration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Tokens whose tops differ by less than this share a row.
    pub row_tolerance: f64,

    /// Tokens closer than this horizontally merge into one cell.
    pub cell_gap: f64,

    /// Horizontal pitch given to grid columns from pre-grouped tables.
    pub grid_column_pitch: f64,

    /// Maximum distance between a value and the anchor column.
    pub anchor_max_distance: f64,

    /// Rows scanned for the reporting-period header.
    pub anchor_scan_rows: usize,

    /// Reporting year; inferred from the header rows when unset.
    pub reporting_year: Option<i32>,

    /// Integers below this magnitude in leading positions are serial numbers.
    pub small_integer_ceiling: f64,

    /// Leading positions checked for serial numbers.
    pub serial_positions: usize,

    /// Smallest integral magnitude accepted by the first-token fallback.
    pub significant_floor: f64,

    /// EPS values above this are mis-parses.
    pub eps_ceiling: f64,

    /// Leading pages scanned for the document mode and default unit.
    pub mode_scan_pages: usize,

    /// Top-scoring pages read per document.
    pub max_candidate_pages: usize,

    /// Statement mode preference.
    pub mode: ModePreference,

    /// Value selection strategy.
    pub strategy: ValueStrategy,

    /// Page scoring weights.
    pub weights: SelectorWeights,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 5.0,
            cell_gap: 4.0,
            grid_column_pitch: 100.0,
            anchor_max_distance: 250.0,
            anchor_scan_rows: 20,
            reporting_year: None,
            small_integer_ceiling: 100.0,
            serial_positions: 2,
            significant_floor: 50.0,
            eps_ceiling: 2000.0,
            mode_scan_pages: 10,
            max_candidate_pages: 1,
            mode: ModePreference::Auto,
            strategy: ValueStrategy::Anchored,
            weights: SelectorWeights::default(),
        }
    }
}

impl QresConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
