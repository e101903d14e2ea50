//! Statement parser orchestrating page selection, row classification and
//! value aggregation.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::aggregator::MetricAggregator;
use super::disambiguator::{Pick, ValueDisambiguator};
use super::rules::patterns::EPS_TEXT;
use super::rules::{
    discover_anchor, numbers_in, row_numbers, Anchor, Classification, KeywordTable, Scale,
    ScaleDetector, Unit,
};
use super::selector::{PageScore, PageSelector};
use crate::error::{ExtractionError, PdfError, Result};
use crate::layout::{rows_from_grid, rows_from_text, PageRows, RowBuilder, RowLayout};
use crate::models::{
    ExtractionResult, MetricKey, MetricValue, ModePreference, Priority, QresConfig, StatementMode,
    Status, ValueStrategy,
};
use crate::pdf::TokenSource;

/// Trait for results statement extraction.
pub trait StatementExtractor {
    /// Extract metrics from a document.
    fn extract(&self, source: &dyn TokenSource) -> Result<ExtractionResult>;
}

/// One row as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct RowReport {
    /// Cell texts.
    pub text: String,
    /// Normalized label.
    pub label: String,
    /// Matched metric, if any.
    pub classification: Option<Classification>,
    /// Value chosen among the row's numbers.
    pub pick: Option<Pick>,
    /// Scaled value, or why it was discarded.
    pub outcome: Option<std::result::Result<f64, ExtractionError>>,
}

/// One page as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct PageReport {
    /// Page number (1-indexed).
    pub page: u32,
    /// Statement mode of the page.
    pub mode: StatementMode,
    /// Page scale.
    pub scale: Scale,
    /// How rows were built.
    pub layout: RowLayout,
    /// Target period column.
    pub anchor: Option<Anchor>,
    /// Rows in page order.
    pub rows: Vec<RowReport>,
}

/// Diagnostic view of a document.
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Document mode.
    pub mode: StatementMode,
    /// Unit found in the leading pages.
    pub document_unit: Option<Unit>,
    /// Scores of every page, in page order.
    pub scores: Vec<PageScore>,
    /// Pages that would be read, or the requested page.
    pub pages: Vec<PageReport>,
}

/// Results statement parser.
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    config: QresConfig,
}

impl StatementParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser from a configuration.
    pub fn from_config(config: QresConfig) -> Self {
        Self { config }
    }

    /// Set the statement mode preference.
    pub fn with_mode(mut self, mode: ModePreference) -> Self {
        self.config.extraction.mode = mode;
        self
    }

    /// Set the value selection strategy.
    pub fn with_strategy(mut self, strategy: ValueStrategy) -> Self {
        self.config.extraction.strategy = strategy;
        self
    }

    /// Replace the keyword table.
    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.config.keywords = keywords;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &QresConfig {
        &self.config
    }

    /// Extract and name the result after `company`.
    pub fn extract_named(&self, source: &dyn TokenSource, company: &str) -> Result<ExtractionResult> {
        Ok(self.extract(source)?.with_company(company))
    }

    /// Page scores, scale and row classification for debugging.
    ///
    /// Reports `page` when given, otherwise the pages extraction would read.
    pub fn inspect(&self, source: &dyn TokenSource, page: Option<u32>) -> Result<Inspection> {
        let texts = self.page_texts(source)?;
        let selector = self.selector();
        let mode = selector.document_mode(&texts, self.config.extraction.mode);
        let scales = self.scale_detector(&texts);

        let scores = texts
            .iter()
            .enumerate()
            .map(|(i, text)| selector.score_page(i as u32 + 1, text, mode))
            .collect();

        let pages = match page {
            Some(page) => {
                source.check_page(page)?;
                if page as usize > texts.len() {
                    return Err(PdfError::InvalidPage(page).into());
                }
                vec![page]
            }
            None => selector
                .select(&texts, mode)
                .map(|s| s.candidates(self.config.extraction.max_candidate_pages))
                .unwrap_or_default(),
        };

        let reports = pages
            .into_iter()
            .map(|p| self.analyze_page(source, p, &texts[(p - 1) as usize], mode, &scales))
            .collect::<Result<Vec<_>>>()?;

        Ok(Inspection {
            mode,
            document_unit: scales.document_unit(),
            scores,
            pages: reports,
        })
    }

    fn selector(&self) -> PageSelector {
        PageSelector::new(
            self.config.extraction.weights.clone(),
            self.config.extraction.mode_scan_pages,
        )
    }

    fn disambiguator(&self) -> ValueDisambiguator {
        ValueDisambiguator::from_config(&self.config.extraction)
    }

    fn page_texts(&self, source: &dyn TokenSource) -> Result<Vec<String>> {
        let mut count = source.page_count();
        if self.config.pdf.max_pages > 0 {
            count = count.min(self.config.pdf.max_pages as u32);
        }
        (1..=count)
            .map(|p| source.page_text(p).map_err(Into::into))
            .collect()
    }

    fn scale_detector(&self, texts: &[String]) -> ScaleDetector {
        let leading = texts
            .iter()
            .take(self.config.extraction.mode_scan_pages)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        ScaleDetector::for_document(&leading)
    }

    /// Rows of a page: grid tables first, then positioned tokens, then text lines.
    fn page_rows(&self, source: &dyn TokenSource, page: u32, text: &str) -> Result<PageRows> {
        let extraction = &self.config.extraction;

        if self.config.pdf.prefer_tables {
            let tables = source.page_tables(page)?;
            if !tables.is_empty() {
                let grid: Vec<Vec<String>> = tables.into_iter().flatten().collect();
                return Ok(PageRows {
                    rows: rows_from_grid(&grid, extraction.grid_column_pitch),
                    layout: RowLayout::Grid,
                });
            }
        }

        let tokens = source.page_tokens(page)?;
        if !tokens.is_empty() {
            let builder = RowBuilder::new(extraction.row_tolerance, extraction.cell_gap);
            return Ok(PageRows {
                rows: builder.build(&tokens),
                layout: RowLayout::Positioned,
            });
        }

        debug!("Page {} has no positioned tokens, reading text lines", page);
        Ok(PageRows {
            rows: rows_from_text(text),
            layout: RowLayout::Text,
        })
    }

    fn analyze_page(
        &self,
        source: &dyn TokenSource,
        page: u32,
        text: &str,
        document_mode: StatementMode,
        scales: &ScaleDetector,
    ) -> Result<PageReport> {
        let extraction = &self.config.extraction;
        let disambiguator = self.disambiguator();

        let mode = page_mode(text, document_mode);
        let scale = scales.detect_page(text);
        let page_rows = self.page_rows(source, page, text)?;

        let anchor = if page_rows.layout.has_columns() {
            discover_anchor(&page_rows.rows, extraction.anchor_scan_rows, extraction.reporting_year)
        } else {
            None
        };

        debug!(
            "Page {}: {} mode, {} rows ({:?}), unit {}, anchor {:?}",
            page,
            mode,
            page_rows.rows.len(),
            page_rows.layout,
            scale.unit,
            anchor.map(|a| a.x0)
        );

        let rows = page_rows
            .rows
            .iter()
            .map(|row| {
                let label = row.label();
                let classification = self.config.keywords.classify(&label);
                let pick = classification.as_ref().and_then(|c| {
                    disambiguator.pick(&row_numbers(row), anchor.map(|a| a.x0), c.key)
                });
                let outcome = match (&classification, &pick) {
                    (Some(c), Some(p)) => Some(disambiguator.normalize(p, c.key, &scale)),
                    _ => None,
                };
                RowReport {
                    text: row.text(),
                    label,
                    classification,
                    pick,
                    outcome,
                }
            })
            .collect();

        Ok(PageReport {
            page,
            mode,
            scale,
            layout: page_rows.layout,
            anchor,
            rows,
        })
    }

    fn eps_from_text(&self, text: &str) -> Option<std::result::Result<f64, ExtractionError>> {
        let caps = EPS_TEXT.captures(text)?;
        let token = numbers_in(&caps[1], 0.0).into_iter().next()?;
        let pick = Pick {
            value: token.value,
            anchored: false,
            candidates: 1,
        };
        Some(
            self.disambiguator()
                .normalize(&pick, MetricKey::Eps, &Scale::default()),
        )
    }
}

/// Mode of a single page; pages naming neither mode follow the document.
fn page_mode(text: &str, document_mode: StatementMode) -> StatementMode {
    let lower = text.to_lowercase();
    if lower.contains(StatementMode::Consolidated.marker()) {
        StatementMode::Consolidated
    } else if lower.contains(StatementMode::Standalone.marker()) {
        StatementMode::Standalone
    } else {
        document_mode
    }
}

impl StatementExtractor for StatementParser {
    fn extract(&self, source: &dyn TokenSource) -> Result<ExtractionResult> {
        let start = Instant::now();
        let mut result = ExtractionResult::empty();

        let texts = self.page_texts(source)?;
        info!("Extracting metrics from {} pages", texts.len());

        let selector = self.selector();
        let mode = selector.document_mode(&texts, self.config.extraction.mode);
        let scales = self.scale_detector(&texts);
        result.mode = Some(mode);

        let selection = match selector.select(&texts, mode) {
            Ok(selection) => selection,
            Err(e) => {
                warn!("{}", e);
                result.warnings.push(e.to_string());
                result.status = Status::Failed;
                result.processing_time_ms = start.elapsed().as_millis() as u64;
                return Ok(result);
            }
        };

        let pages = selection.candidates(self.config.extraction.max_candidate_pages);
        info!("{} statement, reading pages {:?}", mode, pages);

        let mut aggregator = MetricAggregator::new();
        for &page in &pages {
            let text = &texts[(page - 1) as usize];
            let report = self.analyze_page(source, page, text, mode, &scales)?;

            for row in report.rows {
                let (Some(class), Some(pick), Some(outcome)) = (row.classification, row.pick, row.outcome)
                else {
                    continue;
                };

                let value = match outcome {
                    Ok(value) => value,
                    Err(e) => {
                        debug!("{}", e);
                        result.warnings.push(e.to_string());
                        continue;
                    }
                };

                let candidate = MetricValue {
                    value,
                    scale: if class.key.is_per_share() { 1.0 } else { report.scale.divisor() },
                    priority: Priority::for_page(report.mode, pick.anchored),
                    rank: class.rank,
                    page: Some(page),
                };

                if aggregator.offer(class.key, candidate) && !pick.anchored && pick.candidates > 1 {
                    let ambiguity = ExtractionError::AmbiguousValue {
                        metric: class.key.name().to_string(),
                        page,
                        candidates: pick.candidates,
                    };
                    debug!("{}", ambiguity);
                    result.warnings.push(ambiguity.to_string());
                }
            }
        }

        if !aggregator.has(MetricKey::Eps) {
            let found = pages
                .iter()
                .find_map(|&page| self.eps_from_text(&texts[(page - 1) as usize]).map(|v| (page, v)));
            match found {
                Some((page, Ok(value))) => {
                    debug!("EPS {} recovered from page {} text", value, page);
                    aggregator.offer(
                        MetricKey::Eps,
                        MetricValue {
                            page: Some(page),
                            ..MetricValue::derived(value)
                        },
                    );
                }
                Some((_, Err(e))) => result.warnings.push(e.to_string()),
                None => {}
            }
        }

        result.pages = pages;
        aggregator.finalize_into(&mut result);
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extraction finished: {} ({} metrics) in {}ms",
            result.status,
            result.metrics.len(),
            result.processing_time_ms
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Token;
    use crate::pdf::{DumpPage, DumpSource};
    use pretty_assertions::assert_eq;

    fn text_page(text: &str) -> DumpPage {
        DumpPage {
            text: text.to_string(),
            ..DumpPage::default()
        }
    }

    fn words(tokens: &mut Vec<Token>, text: &str, x0: f64, top: f64) {
        let mut x = x0;
        for word in text.split_whitespace() {
            let width = word.len() as f64 * 5.0;
            tokens.push(Token::new(word, x, x + width, top));
            x += width + 2.5;
        }
    }

    fn positioned_page() -> DumpPage {
        let mut tokens = Vec::new();
        words(&mut tokens, "Particulars", 20.0, 40.0);
        words(&mut tokens, "Quarter ended", 300.0, 40.0);
        words(&mut tokens, "30.09.2025", 300.0, 60.0);
        words(&mut tokens, "30.09.2024", 400.0, 61.0);
        words(&mut tokens, "Revenue from Operations", 20.0, 100.0);
        words(&mut tokens, "1,119.18", 300.0, 100.5);
        words(&mut tokens, "1,042.30", 400.0, 99.5);
        DumpPage {
            tokens,
            ..DumpPage::default()
        }
    }

    #[test]
    fn test_anchor_column_selects_current_quarter() {
        let source = DumpSource::new(vec![positioned_page()]);
        let result = StatementParser::new().extract(&source).unwrap();

        let sales = result.metrics[&MetricKey::Sales];
        assert_eq!(sales.value, 1119.18);
        assert_eq!(sales.scale, 1.0);
        assert_eq!(sales.priority, Priority::Standalone);
        assert_eq!(result.pages, vec![1]);
    }

    #[test]
    fn test_lakh_statement_scaled_to_crores() {
        let source = DumpSource::new(vec![text_page(
            "Standalone results for the quarter ended\n(₹ in Lakh)\nParticulars\nNet Profit (50.62)",
        )]);
        let result = StatementParser::new().extract(&source).unwrap();

        let pat = result.metrics[&MetricKey::Pat];
        assert_eq!(pat.value, -0.51);
        assert_eq!(pat.scale, 100.0);
        assert_eq!(pat.priority, Priority::StandaloneFallback);
        assert_eq!(result.record().pat, -0.51);
    }

    #[test]
    fn test_serial_and_note_numbers_skipped() {
        let source = DumpSource::new(vec![text_page(
            "Particulars\n1 Revenue from Operations 25 6171.59",
        )]);
        let result = StatementParser::new().extract(&source).unwrap();
        assert_eq!(result.value(MetricKey::Sales), 6171.59);
        assert_eq!(result.status, Status::Partial);
    }

    #[test]
    fn test_no_statement_page() {
        let source = DumpSource::new(vec![text_page("Notice of board meeting")]);
        let result = StatementParser::new().extract(&source).unwrap();

        assert_eq!(result.status, Status::Failed);
        assert!(result.metrics.is_empty());
        assert_eq!(result.record().sales, 0.0);
        assert_eq!(result.warnings, vec![ExtractionError::NoTargetPage.to_string()]);
    }

    #[test]
    fn test_consolidated_values_survive_standalone_rows() {
        let source = DumpSource::new(vec![
            text_page("Consolidated results quarter ended\nParticulars\nNet Profit 120.50"),
            text_page("Standalone results quarter ended\nParticulars\nNet Profit 80.25\nTotal expenses 400.00"),
        ]);
        let mut config = QresConfig::default();
        config.extraction.max_candidate_pages = 2;

        let result = StatementParser::from_config(config).extract(&source).unwrap();
        assert_eq!(result.mode, Some(StatementMode::Consolidated));
        assert_eq!(result.pages, vec![1, 2]);
        assert_eq!(result.value(MetricKey::Pat), 120.5);
        assert_eq!(result.metrics[&MetricKey::Pat].priority, Priority::ConsolidatedFallback);
        assert_eq!(result.value(MetricKey::Expenses), 400.0);
    }

    #[test]
    fn test_mode_preference_overrides_detection() {
        let source = DumpSource::new(vec![text_page(
            "Consolidated and standalone results quarter ended\nParticulars",
        )]);
        let result = StatementParser::new()
            .with_mode(ModePreference::Standalone)
            .extract(&source)
            .unwrap();
        assert_eq!(result.mode, Some(StatementMode::Standalone));
    }

    #[test]
    fn test_eps_recovered_from_text() {
        let source = DumpSource::new(vec![text_page(
            "Particulars quarter ended\nRevenue from operations 500.00\nEarnings per share\nBasic\n12.34",
        )]);
        let result = StatementParser::new().extract(&source).unwrap();

        let eps = result.metrics[&MetricKey::Eps];
        assert_eq!(eps.value, 12.34);
        assert_eq!(eps.priority, Priority::Derived);
    }

    #[test]
    fn test_implausible_eps_discarded() {
        let source = DumpSource::new(vec![text_page(
            "Particulars quarter ended\nBasic EPS 2025.00",
        )]);
        let result = StatementParser::new().extract(&source).unwrap();
        assert_eq!(result.value(MetricKey::Eps), 0.0);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_grid_tables_preferred() {
        let table = vec![
            vec!["Particulars".to_string(), "31.12.2024".to_string(), "31.12.2023".to_string()],
            vec!["Profit before tax".to_string(), "845.10".to_string(), "700.00".to_string()],
        ];
        let page = DumpPage {
            text: "Particulars quarter ended".to_string(),
            tables: vec![table],
            ..DumpPage::default()
        };
        let source = DumpSource::new(vec![page]);

        let inspection = StatementParser::new().inspect(&source, None).unwrap();
        assert_eq!(inspection.pages[0].layout, RowLayout::Grid);
        assert_eq!(inspection.pages[0].anchor.map(|a| a.x0), Some(100.0));

        let result = StatementParser::new().extract(&source).unwrap();
        assert_eq!(result.value(MetricKey::Pbt), 845.1);
        assert_eq!(result.metrics[&MetricKey::Pbt].priority, Priority::Standalone);
    }

    #[test]
    fn test_label_digits_are_not_values() {
        let mut tokens = Vec::new();
        words(&mut tokens, "Particulars", 20.0, 40.0);
        words(&mut tokens, "Quarter ended", 300.0, 40.0);
        words(&mut tokens, "Basic EPS (Face value Rs 10 each)", 20.0, 100.0);
        words(&mut tokens, "49.93", 300.0, 100.0);
        let source = DumpSource::new(vec![DumpPage {
            tokens,
            ..DumpPage::default()
        }]);

        let result = StatementParser::new().extract(&source).unwrap();
        assert_eq!(result.value(MetricKey::Eps), 49.93);
    }

    #[test]
    fn test_non_controlling_interest_is_not_finance_cost() {
        let source = DumpSource::new(vec![text_page(
            "Standalone results for the quarter ended\nParticulars\nRevenue from operations 1000.00\nProfit before tax 100.00\nNet profit 80.00\nNon-controlling interest 30.00",
        )]);
        let result = StatementParser::new().extract(&source).unwrap();

        assert!(!result.metrics.contains_key(&MetricKey::FinanceCost));
        let record = result.record();
        assert_eq!(record.operating_profit, 100.0);
        assert_eq!(record.operating_margin, 10.0);
        assert_eq!(record.pat, 80.0);
    }

    #[test]
    fn test_segment_page_not_selected() {
        let source = DumpSource::new(vec![
            text_page(
                "Consolidated segment information for the quarter ended\nParticulars\nSegment Revenue\nUnallocable expenditure\nProfit before tax 5.00",
            ),
            text_page(
                "Consolidated results for the quarter ended\nParticulars\nRevenue from operations 1000.00\nTotal expenses 900.00\nProfit before tax 100.00",
            ),
        ]);
        let result = StatementParser::new().extract(&source).unwrap();

        assert_eq!(result.pages, vec![2]);
        assert_eq!(result.value(MetricKey::Sales), 1000.0);
        assert_eq!(result.value(MetricKey::Pbt), 100.0);
    }

    #[test]
    fn test_inspect_rejects_invalid_page() {
        let source = DumpSource::new(vec![text_page("Particulars")]);
        assert!(StatementParser::new().inspect(&source, Some(3)).is_err());
    }
}
