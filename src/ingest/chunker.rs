//! Heading-aware chunking of converted documents.
//!
//! [`HybridChunker`] walks document items in order, keeps a stack of the
//! headings in scope, and packs consecutive paragraphs under the same
//! headings into chunks of at most `max_chars`. Paragraphs that do not fit
//! on their own are split at sentence, then word, boundaries.

use unicode_segmentation::UnicodeSegmentation;

use super::document::{ConvertedDocument, DocItemKind};

/// Default maximum chunk length in bytes.
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// A chunk of document text with its heading context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocChunk {
    /// Chunk text.
    pub text: String,
    /// Headings in scope, outermost first.
    pub headings: Vec<String>,
    /// Pages of the items the chunk was built from, in item order.
    pub pages: Vec<u32>,
}

impl DocChunk {
    /// Outermost heading, or empty when the chunk has none.
    #[must_use]
    pub fn heading(&self) -> &str {
        self.headings.first().map_or("", String::as_str)
    }

    /// Page of the first item in the chunk.
    #[must_use]
    pub fn first_page(&self) -> Option<u32> {
        self.pages.first().copied()
    }
}

/// Splits a converted document into chunks.
pub trait Chunker: Send + Sync {
    /// Chunks the document. Returns an empty list for an empty document.
    fn chunk(&self, document: &ConvertedDocument) -> Vec<DocChunk>;
}

/// Chunker combining heading structure with a size limit.
#[derive(Debug, Clone, Copy)]
pub struct HybridChunker {
    max_chars: usize,
}

impl Default for HybridChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl HybridChunker {
    /// Creates a chunker with the given size limit (at least 1).
    #[must_use]
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }
}

/// Chunk under construction.
struct Pending {
    text: String,
    pages: Vec<u32>,
}

impl Pending {
    const fn new() -> Self {
        Self {
            text: String::new(),
            pages: Vec::new(),
        }
    }

    fn push(&mut self, text: &str, page: u32) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(text);
        self.pages.push(page);
    }
}

impl Chunker for HybridChunker {
    fn chunk(&self, document: &ConvertedDocument) -> Vec<DocChunk> {
        let mut chunks = Vec::new();
        let mut stack: Vec<(u8, String)> = Vec::new();
        let mut pending = Pending::new();

        let flush = |pending: &mut Pending, stack: &[(u8, String)], chunks: &mut Vec<DocChunk>| {
            if pending.text.trim().is_empty() {
                *pending = Pending::new();
                return;
            }
            let done = std::mem::replace(pending, Pending::new());
            chunks.push(DocChunk {
                text: done.text,
                headings: stack.iter().map(|(_, h)| h.clone()).collect(),
                pages: done.pages,
            });
        };

        for item in &document.items {
            match item.kind {
                DocItemKind::Heading { level } => {
                    flush(&mut pending, &stack, &mut chunks);
                    while stack.last().is_some_and(|(l, _)| *l >= level) {
                        stack.pop();
                    }
                    stack.push((level, item.text.clone()));
                }
                DocItemKind::Paragraph => {
                    for piece in split_to_fit(&item.text, self.max_chars) {
                        let separator = usize::from(!pending.text.is_empty());
                        if pending.text.len() + separator + piece.len() > self.max_chars {
                            flush(&mut pending, &stack, &mut chunks);
                        }
                        pending.push(&piece, item.page_no);
                    }
                }
            }
        }
        flush(&mut pending, &stack, &mut chunks);

        chunks
    }
}

/// Splits `text` into pieces of at most `max` bytes at sentence boundaries,
/// falling back to word boundaries for long sentences.
///
/// A single word longer than `max` is kept whole.
fn split_to_fit(text: &str, max: usize) -> Vec<String> {
    if text.len() <= max {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();

    for sentence in text.split_sentence_bounds() {
        if sentence.len() > max {
            for word in sentence.split_word_bounds() {
                append_bounded(&mut pieces, &mut current, word, max);
            }
        } else {
            append_bounded(&mut pieces, &mut current, sentence, max);
        }
    }
    if !current.trim().is_empty() {
        pieces.push(current.trim().to_string());
    }

    pieces
}

fn append_bounded(pieces: &mut Vec<String>, current: &mut String, segment: &str, max: usize) {
    if !current.is_empty() && current.len() + segment.len() > max {
        let full = std::mem::take(current);
        if !full.trim().is_empty() {
            pieces.push(full.trim().to_string());
        }
    }
    current.push_str(segment);
}
