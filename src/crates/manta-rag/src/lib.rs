//! Document indexing, retrieval, and vision-page tools.
//!
//! This crate owns everything between "a folder of files" and "a
//! `CONTEXT` block the agent can ground on":
//!
//! - [`loader`]: walks the docs folder; txt/md load whole, PDFs load
//!   per page
//! - [`splitter`]: recursive character chunking with overlap
//! - [`index`]: embeds chunks and persists them as `index.json`
//! - [`retriever`]: cosine-ranked lookup plus a `(store, k)` memo table
//! - [`tools`]: the two agent-facing tools, `rag_search` and
//!   `vision_pdf_search`
//! - [`pdf`]: poppler-backed text extraction and page rendering behind
//!   traits
//!
//! Model access goes through the [`manta_core::EmbeddingModel`] and
//! [`manta_core::ChatModel`] traits; concrete providers are injected by
//! the caller.

pub mod config;
pub mod error;
pub mod index;
pub mod loader;
pub mod pdf;
pub mod retriever;
pub mod splitter;
pub mod tools;

pub use config::{
    RagConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_DOCS_DIR, DEFAULT_EMBED_MODEL,
    DEFAULT_IMAGE_DIR, DEFAULT_MAX_PAGES, DEFAULT_RENDER_DPI, DEFAULT_STORE_DIR, DEFAULT_TOP_K,
};
pub use error::{RagError, Result};
pub use index::{BuildOutcome, IndexBuilder, IndexEntry, VectorIndex, INDEX_FILE};
pub use loader::{DocumentLoader, RawDocument};
pub use pdf::{PageRenderer, PdfTextExtractor, PopplerExtractor, PopplerRenderer};
pub use retriever::{Retriever, RetrieverCache, Snippet};
pub use splitter::TextSplitter;
pub use tools::{
    DocumentSearchTool, VisionPdfTool, DOCUMENT_SEARCH_TOOL, NO_CONTEXT_MARKER,
    NO_CONTEXT_SENTINEL, VISION_QUESTION_PREFIX, VISION_TEMPERATURE, VISION_TOOL,
};
