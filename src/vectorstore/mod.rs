//! Vector store access for contract chunks.
//!
//! [`WeaviateClient`] talks to a Weaviate cluster over REST; the rest of the
//! crate depends only on the [`VectorStore`] trait.

pub mod config;
pub mod search_tool;
pub mod weaviate;

pub use config::VectorStoreConfig;
pub use search_tool::{SEARCH_TOOL_NAME, VectorSearchTool};
pub use weaviate::{
    BatchSummary, ConnectionGuard, ContractChunk, SearchHit, StoreConnector, VectorStore, WeaviateClient,
};
