//! Common regex patterns for results statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Number fragments split by stray spaces around a separator: "1 ,119.18", "1,1 19.18"
    pub static ref SPLIT_BEFORE_SEPARATOR: Regex = Regex::new(r"(\d)\s+([,.]\d)").unwrap();
    pub static ref SPLIT_AFTER_SEPARATOR: Regex = Regex::new(r"(\d[,.])\s+(\d)").unwrap();

    // Accounting negatives: "(50.62)"
    pub static ref PAREN_NEGATIVE: Regex = Regex::new(r"\(\s*(\d[\d,.]*)\s*\)").unwrap();

    // Signed numeric literal
    pub static ref NUMBER: Regex = Regex::new(r"-?\d[\d,.]*").unwrap();

    // Unit words
    pub static ref UNIT_CRORE: Regex = Regex::new(r"(?i)\bcrores?\b").unwrap();
    pub static ref UNIT_LAKH: Regex = Regex::new(r"(?i)\b(?:lakhs?|lacs?)\b").unwrap();
    pub static ref UNIT_MILLION: Regex = Regex::new(r"(?i)\b(?:millions?|mn)\b").unwrap();
    pub static ref UNIT_THOUSAND: Regex = Regex::new(r"(?i)\bthousands?\b").unwrap();

    // Explicit unit phrase: "(₹ in Lakh)", "Rs. in Crores", "in INR million"
    pub static ref IN_UNIT: Regex = Regex::new(
        r"(?i)\bin\s+(?:(?:₹|rs\.?|inr|rupees)\s*)?(crores?|lakhs?|lacs?|millions?|mn|thousands?)\b"
    ).unwrap();

    // Figures stated in plain rupees: "(in ₹)", "in Rupees"
    pub static ref IN_RUPEES: Regex = Regex::new(r"(?i)\bin\s+(?:₹|(?:rupees|inr|rs)\b)").unwrap();

    // Period header fragments
    pub static ref FOUR_DIGIT_YEAR: Regex = Regex::new(r"\b(20\d{2})\b").unwrap();
    pub static ref DAY_MONTH: Regex = Regex::new(
        r"(?i)\b(?:30|31|jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)"
    ).unwrap();
    pub static ref SHORT_DATE_YEAR: Regex = Regex::new(
        r"\b\d{1,2}[./\-](?:\d{1,2}|[A-Za-z]{3,4})[./\-](\d{2})\b"
    ).unwrap();

    // Earnings-per-share line in free text
    pub static ref EPS_TEXT: Regex = Regex::new(
        r"(?is)earnings?\s+per\s+(?:equity\s+)?share.{0,200}?basic[^\d(\-]{0,40}(\(?-?\d[\d,]*\.\d+\)?)"
    ).unwrap();

    // Auditor's review report pages
    pub static ref AUDITOR_REPORT: Regex = Regex::new(
        r"(?i)independent\s+auditor|limited\s+review\s+report|review\s+report\s+to|we\s+have\s+reviewed"
    ).unwrap();

    // Revenue keywords used for page scoring
    pub static ref REVENUE_WORD: Regex = Regex::new(
        r"(?i)revenue|income\s+from\s+operations|net\s+sales"
    ).unwrap();
}
