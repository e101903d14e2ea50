//! Results page selection.

use serde::Serialize;
use tracing::debug;

use super::rules::patterns::{AUDITOR_REPORT, REVENUE_WORD};
use crate::error::ExtractionError;
use crate::models::{ModePreference, SelectorWeights, StatementMode};

/// Score of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageScore {
    /// Page number (1-indexed).
    pub page: u32,
    /// Weighted keyword score.
    pub score: i32,
    /// Page carries a period marker or the table header word.
    pub qualifies: bool,
    /// Page looks like an auditor's review report.
    pub auditor: bool,
}

/// Qualifying pages ranked best first, ties in document order.
#[derive(Debug, Clone, Serialize)]
pub struct PageSelection {
    /// Mode the pages were scored against.
    pub mode: StatementMode,
    /// Qualifying pages, best first.
    pub ranked: Vec<PageScore>,
}

impl PageSelection {
    /// Best page.
    pub fn best(&self) -> Option<u32> {
        self.ranked.first().map(|s| s.page)
    }

    /// Up to `n` top pages, in document order.
    pub fn candidates(&self, n: usize) -> Vec<u32> {
        let mut pages: Vec<u32> = self.ranked.iter().take(n.max(1)).map(|s| s.page).collect();
        pages.sort_unstable();
        pages
    }
}

/// Scores pages against statement keywords and mode markers.
#[derive(Debug, Clone)]
pub struct PageSelector {
    weights: SelectorWeights,
    mode_scan_pages: usize,
}

impl PageSelector {
    /// Create a selector.
    pub fn new(weights: SelectorWeights, mode_scan_pages: usize) -> Self {
        Self {
            weights,
            mode_scan_pages,
        }
    }

    /// Decide which statement to read.
    ///
    /// `Auto` picks consolidated when the leading pages mention it.
    pub fn document_mode(&self, texts: &[String], preference: ModePreference) -> StatementMode {
        match preference {
            ModePreference::Consolidated => StatementMode::Consolidated,
            ModePreference::Standalone => StatementMode::Standalone,
            ModePreference::Auto => {
                let mentions = texts
                    .iter()
                    .take(self.mode_scan_pages)
                    .any(|t| t.to_lowercase().contains(StatementMode::Consolidated.marker()));
                if mentions {
                    StatementMode::Consolidated
                } else {
                    StatementMode::Standalone
                }
            }
        }
    }

    /// Score one page.
    pub fn score_page(&self, page: u32, text: &str, mode: StatementMode) -> PageScore {
        let lower = text.to_lowercase();
        let w = &self.weights;

        let particulars = lower.contains("particulars");
        let qualifies = particulars || lower.contains("ended");
        let auditor = AUDITOR_REPORT.is_match(&lower);

        let mut score = 0;
        if particulars {
            score += w.particulars;
        }
        if REVENUE_WORD.is_match(&lower) {
            score += w.revenue;
        }
        if lower.contains("expenses") || lower.contains("expenditure") {
            score += w.expenses;
        }
        if lower.contains(mode.marker()) {
            score += w.mode_match;
        }
        if mode == StatementMode::Consolidated
            && lower.contains(StatementMode::Standalone.marker())
            && !lower.contains(StatementMode::Consolidated.marker())
        {
            score -= w.other_mode_penalty;
        }
        if auditor {
            score -= w.auditor_penalty;
        }
        if lower.contains("segment") {
            score -= w.segment_penalty;
        }

        PageScore {
            page,
            score,
            qualifies,
            auditor,
        }
    }

    /// Rank the qualifying pages of a document.
    pub fn select(&self, texts: &[String], mode: StatementMode) -> Result<PageSelection, ExtractionError> {
        let mut ranked: Vec<PageScore> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| self.score_page(i as u32 + 1, text, mode))
            .filter(|s| s.qualifies)
            .collect();

        // Stable sort keeps the first page among equal scores.
        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        for s in &ranked {
            debug!("Page {} score {}{}", s.page, s.score, if s.auditor { " (auditor)" } else { "" });
        }

        if ranked.is_empty() {
            return Err(ExtractionError::NoTargetPage);
        }
        Ok(PageSelection { mode, ranked })
    }
}

impl Default for PageSelector {
    fn default() -> Self {
        Self::new(SelectorWeights::default(), 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_document_mode() {
        let selector = PageSelector::default();
        let texts = pages(&["Notice", "Statement of Consolidated results"]);

        assert_eq!(
            selector.document_mode(&texts, ModePreference::Auto),
            StatementMode::Consolidated
        );
        assert_eq!(
            selector.document_mode(&pages(&["Standalone results"]), ModePreference::Auto),
            StatementMode::Standalone
        );
        assert_eq!(
            selector.document_mode(&texts, ModePreference::Standalone),
            StatementMode::Standalone
        );
    }

    #[test]
    fn test_mode_scan_window() {
        let selector = PageSelector::new(SelectorWeights::default(), 1);
        let texts = pages(&["Notice", "Consolidated"]);
        assert_eq!(
            selector.document_mode(&texts, ModePreference::Auto),
            StatementMode::Standalone
        );
    }

    #[test]
    fn test_score_page() {
        let selector = PageSelector::default();
        let text = "Statement of Consolidated Results for the quarter ended\nParticulars\nRevenue from operations\nTotal expenses";

        let score = selector.score_page(3, text, StatementMode::Consolidated);
        assert_eq!(
            score,
            PageScore {
                page: 3,
                score: 30,
                qualifies: true,
                auditor: false
            }
        );
    }

    #[test]
    fn test_selects_consolidated_over_standalone_page() {
        let selector = PageSelector::default();
        let texts = pages(&[
            "Standalone results quarter ended Particulars Revenue Total expenses",
            "Consolidated results quarter ended Particulars Revenue Total expenses",
            "Independent Auditor's Review Report on consolidated results for the quarter ended",
        ]);

        let selection = selector.select(&texts, StatementMode::Consolidated).unwrap();
        assert_eq!(selection.best(), Some(2));
        assert_eq!(selection.ranked.len(), 3);
        assert_eq!(selection.candidates(2), vec![1, 2]);
    }

    #[test]
    fn test_segment_page_loses_to_results_page() {
        let selector = PageSelector::default();
        let texts = pages(&[
            "Consolidated segment information for the quarter ended\nParticulars\nSegment Revenue\nUnallocable expenditure",
            "Consolidated results for the quarter ended\nParticulars\nRevenue from operations\nTotal expenses",
        ]);

        let selection = selector.select(&texts, StatementMode::Consolidated).unwrap();
        assert_eq!(selection.best(), Some(2));
        assert_eq!(selection.ranked[1].score, 15);
    }

    #[test]
    fn test_ties_go_to_first_page() {
        let selector = PageSelector::default();
        let texts = pages(&["Particulars", "Particulars"]);
        let selection = selector.select(&texts, StatementMode::Standalone).unwrap();
        assert_eq!(selection.best(), Some(1));
    }

    #[test]
    fn test_no_qualifying_page() {
        let selector = PageSelector::default();
        let texts = pages(&["Notice of board meeting", "Revenue"]);
        assert_eq!(
            selector.select(&texts, StatementMode::Standalone).unwrap_err(),
            ExtractionError::NoTargetPage
        );
    }
}
