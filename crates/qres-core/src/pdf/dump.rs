//! Page dumps: pre-extracted pages stored as JSON.
//!
//! ```json
//! {"pages": [{"text": "...", "tokens": [{"text": "Revenue", "x0": 20.0, "x1": 60.0, "top": 100.0}], "tables": []}]}
//! ```

use serde::{Deserialize, Serialize};

use super::{Result, Table, TokenSource};
use crate::error::QresError;
use crate::layout::Token;

/// One page of a dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpPage {
    /// Plain text; rebuilt from tokens when empty.
    pub text: String,
    /// Positioned tokens.
    pub tokens: Vec<Token>,
    /// Pre-grouped tables.
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DumpFile {
    pages: Vec<DumpPage>,
}

/// Token source over pre-extracted pages.
#[derive(Debug, Clone, Default)]
pub struct DumpSource {
    pages: Vec<DumpPage>,
}

impl DumpSource {
    /// Create a source from pages.
    pub fn new(pages: Vec<DumpPage>) -> Self {
        Self { pages }
    }

    /// Parse a JSON dump.
    pub fn from_json(json: &str) -> std::result::Result<Self, QresError> {
        let file: DumpFile = serde_json::from_str(json)?;
        Ok(Self::new(file.pages))
    }

    /// Read a JSON dump from disk.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, QresError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize back to JSON.
    pub fn to_json(&self) -> std::result::Result<String, QresError> {
        let file = DumpFile {
            pages: self.pages.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    fn page(&self, page: u32) -> Result<&DumpPage> {
        self.check_page(page)?;
        Ok(&self.pages[(page - 1) as usize])
    }
}

impl TokenSource for DumpSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let page = self.page(page)?;
        if !page.text.is_empty() || page.tokens.is_empty() {
            return Ok(page.text.clone());
        }

        let mut tokens: Vec<&Token> = page.tokens.iter().collect();
        tokens.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));
        Ok(tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn page_tokens(&self, page: u32) -> Result<Vec<Token>> {
        Ok(self.page(page)?.tokens.clone())
    }

    fn page_tables(&self, page: u32) -> Result<Vec<Table>> {
        Ok(self.page(page)?.tables.clone())
    }
}
