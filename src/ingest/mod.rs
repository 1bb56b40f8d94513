//! Contract document ingestion.
//!
//! ```text
//! folder/*.pdf → PdfConverter → ConvertedDocument → HybridChunker → DocChunk
//!              → ContractChunk { text, source_file, heading, page_number } → VectorStore
//! ```

pub mod chunker;
pub mod document;
pub mod pdf;
pub mod service;

pub use chunker::{Chunker, DocChunk, HybridChunker};
pub use document::{ConvertedDocument, DocItem, DocItemKind, DocumentConverter};
pub use pdf::PdfConverter;
pub use service::ContractProcessingService;
