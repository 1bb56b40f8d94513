//! Converted-document model shared by converters and chunkers.

use std::path::Path;

use crate::error::IngestError;

/// Kind of a document item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocItemKind {
    /// Section heading with nesting depth (1 = top level).
    Heading {
        /// Nesting depth.
        level: u8,
    },
    /// Body text.
    Paragraph,
}

/// A heading or paragraph with the page it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocItem {
    /// Item kind.
    pub kind: DocItemKind,
    /// Item text, whitespace-normalised.
    pub text: String,
    /// 1-based page number.
    pub page_no: u32,
}

impl DocItem {
    /// Creates a heading item.
    #[must_use]
    pub fn heading(level: u8, text: impl Into<String>, page_no: u32) -> Self {
        Self {
            kind: DocItemKind::Heading { level },
            text: text.into(),
            page_no,
        }
    }

    /// Creates a paragraph item.
    #[must_use]
    pub fn paragraph(text: impl Into<String>, page_no: u32) -> Self {
        Self {
            kind: DocItemKind::Paragraph,
            text: text.into(),
            page_no,
        }
    }
}

/// A document converted into an ordered list of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Filename the document was converted from.
    pub source: String,
    /// Items in reading order.
    pub items: Vec<DocItem>,
}

/// Turns a file into a [`ConvertedDocument`].
pub trait DocumentConverter: Send + Sync {
    /// Converts the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] if the file cannot be read or
    /// [`IngestError::Conversion`] if it cannot be parsed.
    fn convert(&self, path: &Path) -> Result<ConvertedDocument, IngestError>;
}
