//! PDF conversion using `pdf-extract`.
//!
//! Text is extracted page by page, then split into headings and paragraphs
//! with line-level heuristics tuned for contract layouts (numbered clauses,
//! `ARTICLE`/`Section` captions, short all-caps titles).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::document::{ConvertedDocument, DocItem, DocumentConverter};
use crate::error::IngestError;

/// Lines longer than this are never treated as headings.
const MAX_HEADING_CHARS: usize = 100;

/// `1.`, `7.2`, `12.3.1 Title`
static NUMBERED_HEADING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+([A-Z].*)$").ok());

/// `ARTICLE IV`, `Section 7`, `SCHEDULE A`, `Exhibit 2`
static CAPTION_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^(article|section|schedule|exhibit|appendix|annex)\s+[0-9IVXLC]+[.:]?(\s|$)")
        .ok()
});

/// PDF converter backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfConverter;

impl PdfConverter {
    /// Creates a converter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentConverter for PdfConverter {
    fn convert(&self, path: &Path) -> Result<ConvertedDocument, IngestError> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: display.clone(),
            source,
        })?;

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            IngestError::Conversion {
                path: display.clone(),
                message: e.to_string(),
            }
        })?;

        let source = path
            .file_name()
            .map_or_else(|| display.clone(), |n| n.to_string_lossy().into_owned());
        let document = convert_pages(&source, &pages);
        debug!(
            file = %source,
            pages = pages.len(),
            items = document.items.len(),
            "converted pdf"
        );
        Ok(document)
    }
}

/// Splits extracted page texts into document items.
#[must_use]
pub fn convert_pages(source: &str, pages: &[String]) -> ConvertedDocument {
    let mut items = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let page_no = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let mut paragraph: Vec<&str> = Vec::new();

        for line in page.lines().map(str::trim) {
            if line.is_empty() {
                flush_paragraph(&mut paragraph, &mut items, page_no);
            } else if let Some(level) = heading_level(line) {
                flush_paragraph(&mut paragraph, &mut items, page_no);
                items.push(DocItem::heading(level, normalize(line), page_no));
            } else {
                paragraph.push(line);
            }
        }
        flush_paragraph(&mut paragraph, &mut items, page_no);
    }

    ConvertedDocument {
        source: source.to_string(),
        items,
    }
}

fn flush_paragraph(lines: &mut Vec<&str>, items: &mut Vec<DocItem>, page_no: u32) {
    if lines.is_empty() {
        return;
    }
    items.push(DocItem::paragraph(normalize(&lines.join(" ")), page_no));
    lines.clear();
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the heading level if `line` looks like a heading.
#[must_use]
pub fn heading_level(line: &str) -> Option<u8> {
    let line = line.trim();
    if line.is_empty() || line.chars().count() > MAX_HEADING_CHARS {
        return None;
    }

    if CAPTION_HEADING.as_ref().is_some_and(|re| re.is_match(line)) {
        return Some(1);
    }

    if let Some(caps) = NUMBERED_HEADING.as_ref().and_then(|re| re.captures(line)) {
        let title = caps.get(2).map_or("", |m| m.as_str());
        // Numbered sentences ("1. The Licensee shall ...") are clauses, not headings.
        if !title.ends_with('.') && title.split_whitespace().count() <= 8 {
            let depth = caps
                .get(1)
                .map_or(1, |m| m.as_str().split('.').count());
            return Some(u8::try_from(depth).unwrap_or(u8::MAX));
        }
        return None;
    }

    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    let all_caps = letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase());
    if all_caps && !line.ends_with('.') && line.split_whitespace().count() <= 8 {
        return Some(1);
    }

    None
}
