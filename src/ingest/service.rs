//! Contract ingestion: PDFs in a folder → chunks → vector store.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::chunker::{Chunker, DocChunk, HybridChunker};
use super::document::DocumentConverter;
use super::pdf::PdfConverter;
use crate::error::{IngestError, VectorStoreError};
use crate::vectorstore::{ConnectionGuard, ContractChunk, StoreConnector, VectorStore};

/// Converts, chunks and uploads contract PDFs.
pub struct ContractProcessingService {
    converter: Box<dyn DocumentConverter>,
    chunker: Box<dyn Chunker>,
}

impl Default for ContractProcessingService {
    fn default() -> Self {
        Self::new(Box::new(PdfConverter::new()), Box::new(HybridChunker::default()))
    }
}

impl ContractProcessingService {
    /// Creates a service with the given converter and chunker.
    #[must_use]
    pub fn new(converter: Box<dyn DocumentConverter>, chunker: Box<dyn Chunker>) -> Self {
        Self { converter, chunker }
    }

    /// Ingests every `.pdf` file directly inside `folder`.
    ///
    /// Opens a connection, checks readiness before touching the filesystem,
    /// creates the collection if needed, converts and chunks each file, and
    /// inserts all chunks in one batch. The connection is closed before
    /// returning, whatever the outcome.
    ///
    /// Returns the number of chunks submitted.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::VectorStore`] if the store is unreachable or not
    /// ready, [`IngestError::Io`] if the folder cannot be listed, or a
    /// conversion error for the first file that fails.
    pub async fn process_contracts(
        &self,
        folder: &Path,
        connector: &dyn StoreConnector,
    ) -> Result<usize, IngestError> {
        let guard = ConnectionGuard::new(connector.connect()?);
        let store = guard.store();

        if !store.is_ready().await? {
            return Err(VectorStoreError::NotReady {
                url: connector.location(),
            }
            .into());
        }
        store.ensure_collection().await?;

        let files = list_pdfs(folder)?;
        info!(folder = %folder.display(), files = files.len(), "ingesting contracts");

        let mut chunks = Vec::new();
        for path in &files {
            let document = self.converter.convert(path)?;
            let doc_chunks = self.chunker.chunk(&document);
            debug!(file = %document.source, chunks = doc_chunks.len(), "chunked document");
            chunks.extend(
                doc_chunks
                    .iter()
                    .map(|chunk| to_contract_chunk(&document.source, chunk)),
            );
        }

        if chunks.is_empty() {
            info!("no chunks to insert");
            return Ok(0);
        }

        let summary = store.insert_many(&chunks).await?;
        if summary.failed > 0 {
            warn!(
                failed = summary.failed,
                submitted = summary.submitted,
                "some chunks were rejected by the vector store"
            );
        }
        info!(chunks = chunks.len(), "processed contract chunks");

        Ok(chunks.len())
    }
}

fn to_contract_chunk(source: &str, chunk: &DocChunk) -> ContractChunk {
    ContractChunk {
        text: chunk.text.clone(),
        source_file: source.to_string(),
        heading: chunk.heading().to_string(),
        page_number: chunk.first_page(),
    }
}

/// Lists files in `folder` whose name ends in `.pdf`, sorted by name.
fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source: std::io::Error| IngestError::Io {
        path: folder.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_pdf = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
