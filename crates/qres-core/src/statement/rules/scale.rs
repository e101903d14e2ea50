//! Unit-of-measure detection.
//!
//! Aggregate figures are normalized to crores. A statement printed in
//! lakhs is divided by 100, one in millions by 10, and so on.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use super::patterns::{IN_RUPEES, IN_UNIT, UNIT_CRORE, UNIT_LAKH, UNIT_MILLION, UNIT_THOUSAND};

/// A unit the statement figures are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Crore,
    Lakh,
    Million,
    Thousand,
    Rupees,
}

impl Unit {
    /// Divisor bringing a figure in this unit to crores.
    pub fn divisor(&self) -> f64 {
        match self {
            Unit::Crore => 1.0,
            Unit::Lakh => 100.0,
            Unit::Million => 10.0,
            Unit::Thousand => 1000.0,
            Unit::Rupees => 10_000_000.0,
        }
    }

    fn from_word(word: &str) -> Option<Unit> {
        let word = word.to_lowercase();
        if word.starts_with("crore") {
            Some(Unit::Crore)
        } else if word.starts_with("lakh") || word.starts_with("lac") {
            Some(Unit::Lakh)
        } else if word.starts_with("million") || word == "mn" {
            Some(Unit::Million)
        } else if word.starts_with("thousand") {
            Some(Unit::Thousand)
        } else {
            None
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Crore => f.write_str("crore"),
            Unit::Lakh => f.write_str("lakh"),
            Unit::Million => f.write_str("million"),
            Unit::Thousand => f.write_str("thousand"),
            Unit::Rupees => f.write_str("rupees"),
        }
    }
}

/// Where a page's unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSource {
    /// An "in <unit>" phrase on the page.
    Phrase,
    /// A unit word elsewhere on the page.
    Page,
    /// The document default.
    Document,
    /// Nothing found; figures assumed to be in crores.
    Assumed,
}

/// Detected scale of a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    /// Detected unit.
    pub unit: Unit,
    /// Origin of the detection.
    pub source: ScaleSource,
}

impl Scale {
    /// Divisor applied to aggregate figures.
    pub fn divisor(&self) -> f64 {
        self.unit.divisor()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            unit: Unit::Crore,
            source: ScaleSource::Assumed,
        }
    }
}

/// Unit detection over page and document text.
#[derive(Debug, Clone, Default)]
pub struct ScaleDetector {
    document: Option<Unit>,
}

impl ScaleDetector {
    /// Detector with the document default taken from the leading pages.
    pub fn for_document(leading_text: &str) -> Self {
        Self {
            document: detect_unit(leading_text),
        }
    }

    /// Document-level unit, if any was mentioned.
    pub fn document_unit(&self) -> Option<Unit> {
        self.document
    }

    /// Scale of one page.
    pub fn detect_page(&self, page_text: &str) -> Scale {
        if let Some(unit) = phrase_unit(page_text) {
            return Scale {
                unit,
                source: ScaleSource::Phrase,
            };
        }
        if let Some(unit) = detect_unit(page_text) {
            return Scale {
                unit,
                source: ScaleSource::Page,
            };
        }
        match self.document {
            Some(unit) => Scale {
                unit,
                source: ScaleSource::Document,
            },
            None => Scale::default(),
        }
    }
}

fn phrase_unit(text: &str) -> Option<Unit> {
    IN_UNIT
        .captures(text)
        .and_then(|caps| Unit::from_word(&caps[1]))
}

/// Unit mentioned in `text`, strongest evidence first.
pub fn detect_unit(text: &str) -> Option<Unit> {
    if let Some(unit) = phrase_unit(text) {
        return Some(unit);
    }

    let words: [(&Regex, Unit); 4] = [
        (&*UNIT_CRORE, Unit::Crore),
        (&*UNIT_LAKH, Unit::Lakh),
        (&*UNIT_MILLION, Unit::Million),
        (&*UNIT_THOUSAND, Unit::Thousand),
    ];
    for (pattern, unit) in words {
        if pattern.is_match(text) {
            return Some(unit);
        }
    }

    IN_RUPEES.is_match(text).then_some(Unit::Rupees)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_priority() {
        assert_eq!(detect_unit("figures in crores and lakhs"), Some(Unit::Crore));
        assert_eq!(detect_unit("Rs. Lakhs"), Some(Unit::Lakh));
        assert_eq!(detect_unit("USD million"), Some(Unit::Million));
        assert_eq!(detect_unit("(Amount in ₹)"), Some(Unit::Rupees));
        assert_eq!(detect_unit("place of supply"), None);
    }

    #[test]
    fn test_phrase_beats_other_mentions() {
        let detector = ScaleDetector::default();
        let scale = detector.detect_page("Net worth exceeds 500 crore\n(₹ in Lakh)");
        assert_eq!(scale.unit, Unit::Lakh);
        assert_eq!(scale.source, ScaleSource::Phrase);
        assert_eq!(scale.divisor(), 100.0);
    }

    #[test]
    fn test_page_overrides_document_default() {
        let detector = ScaleDetector::for_document("All amounts in Rs. Lakhs");
        assert_eq!(detector.document_unit(), Some(Unit::Lakh));

        let page = detector.detect_page("Statement of results (Rs. in Million)");
        assert_eq!(page.unit, Unit::Million);

        let page = detector.detect_page("Particulars Quarter ended");
        assert_eq!(page.unit, Unit::Lakh);
        assert_eq!(page.source, ScaleSource::Document);
    }

    #[test]
    fn test_no_unit_defaults_to_crore() {
        let scale = ScaleDetector::default().detect_page("Particulars");
        assert_eq!(scale, Scale::default());
        assert_eq!(scale.divisor(), 1.0);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let detector = ScaleDetector::for_document("in thousands");
        let text = "Revenue (in lacs)";
        assert_eq!(detector.detect_page(text), detector.detect_page(text));
    }
}
