//! PDF text and glyph extraction using lopdf and pdf-extract.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use lopdf::Document;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, trace};

use super::{Result, TokenSource};
use crate::error::PdfError;
use crate::layout::Token;

/// PDF token source.
///
/// The document is parsed once on load. Page texts and glyph positions are
/// decoded lazily, on first use, and cached for the extractor's lifetime.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
    texts: OnceCell<Vec<String>>,
    tokens: OnceCell<BTreeMap<u32, Vec<Token>>>,
}

impl PdfExtractor {
    /// Load a PDF from bytes, decrypting it with `password` if needed.
    pub fn load(data: &[u8], password: &str) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt(password).is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF");

            // pdf-extract reads the decrypted copy
            let mut decrypted_data = Vec::new();
            document
                .save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted_data
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            document,
            raw_data,
            texts: OnceCell::new(),
            tokens: OnceCell::new(),
        })
    }

    /// Load a PDF file from disk.
    pub fn open(path: &std::path::Path, password: &str) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::load(&data, password)
    }

    fn texts(&self) -> Result<&Vec<String>> {
        if let Some(texts) = self.texts.get() {
            return Ok(texts);
        }
        let texts = pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        debug!("Extracted text of {} pages", texts.len());
        Ok(self.texts.get_or_init(|| texts))
    }

    fn tokens(&self) -> Result<&BTreeMap<u32, Vec<Token>>> {
        if let Some(tokens) = self.tokens.get() {
            return Ok(tokens);
        }
        let doc = pdf_extract::Document::load_mem(&self.raw_data)
            .map_err(|e| PdfError::Parse(e.to_string()))?;
        let mut collector = TokenCollector::default();
        pdf_extract::output_doc(&doc, &mut collector)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        debug!(
            "Decoded {} tokens over {} pages",
            collector.pages.values().map(Vec::len).sum::<usize>(),
            collector.pages.len()
        );
        Ok(self.tokens.get_or_init(|| collector.pages))
    }
}

impl TokenSource for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.check_page(page)?;
        Ok(self
            .texts()?
            .get((page - 1) as usize)
            .cloned()
            .unwrap_or_default())
    }

    fn page_tokens(&self, page: u32) -> Result<Vec<Token>> {
        self.check_page(page)?;
        Ok(self.tokens()?.get(&page).cloned().unwrap_or_default())
    }
}

/// Groups glyphs emitted by pdf-extract into word tokens.
#[derive(Default)]
struct TokenCollector {
    pages: BTreeMap<u32, Vec<Token>>,
    page: u32,
    page_height: f64,
    word: Option<Token>,
    glyph_size: f64,
}

impl TokenCollector {
    fn flush(&mut self) {
        if let Some(word) = self.word.take() {
            if !word.text.trim().is_empty() {
                trace!("Token '{}' at ({:.1}, {:.1})", word.text, word.x0, word.top);
                self.pages.entry(self.page).or_default().push(word);
            }
        }
    }
}

impl OutputDev for TokenCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.flush();
        self.page = page_num;
        self.page_height = media_box.ury - media_box.lly;
        self.pages.entry(page_num).or_default();
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        let size = font_size * (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
        let x0 = trm.m31;
        let x1 = x0 + width * size;
        let top = self.page_height - trm.m32 - size;

        if char.trim().is_empty() {
            self.flush();
            return Ok(());
        }

        let continues = self.word.as_ref().is_some_and(|w| {
            let gap = x0 - w.x1;
            (top - w.top).abs() < self.glyph_size * 0.5 && gap > -self.glyph_size * 0.5 && gap < self.glyph_size * 0.25
        });

        if continues {
            if let Some(word) = self.word.as_mut() {
                word.text.push_str(char);
                word.x1 = word.x1.max(x1);
            }
        } else {
            self.flush();
            self.word = Some(Token::new(char, x0, x1, top));
            self.glyph_size = size;
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }
}
