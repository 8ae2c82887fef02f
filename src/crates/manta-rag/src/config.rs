//! Retrieval configuration and defaults.
//!
//! Every default here is overridable by CLI flag, and most also by
//! environment variable (`RAG_STORE_DIR`, `RAG_DOCS_DIR`, `RAG_TOP_K`,
//! `RAG_EMBED_MODEL`, `PAGE_IMG_DIR`, `MAX_PAGES_PER_PDF`, `RENDER_DPI`).
//! The flag layer lives in the CLI crate; this struct is what the tools
//! actually consume.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default folder scanned for source documents.
pub const DEFAULT_DOCS_DIR: &str = "./docs";

/// Default folder holding the persisted index.
pub const DEFAULT_STORE_DIR: &str = "./rag_store";

/// Default number of snippets returned per query.
pub const DEFAULT_TOP_K: usize = 4;

/// Default embedding model identifier.
pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";

/// Default folder for rendered PDF page images.
pub const DEFAULT_IMAGE_DIR: &str = "./page_images";

/// Default cap on pages rendered per PDF.
pub const DEFAULT_MAX_PAGES: usize = 3;

/// Default render resolution in dots per inch.
pub const DEFAULT_RENDER_DPI: u32 = 200;

/// Default chunk size for the character splitter.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Settings shared by the retrieval and vision tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Folder scanned for source documents (and PDFs for vision)
    pub docs_dir: PathBuf,

    /// Folder holding the persisted index
    pub store_dir: PathBuf,

    /// Number of snippets returned per query
    pub top_k: usize,

    /// Folder for rendered PDF page images
    pub image_dir: PathBuf,

    /// Cap on pages rendered per PDF
    pub max_pages: usize,

    /// Render resolution in dots per inch
    pub dpi: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            top_k: DEFAULT_TOP_K,
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            max_pages: DEFAULT_MAX_PAGES,
            dpi: DEFAULT_RENDER_DPI,
        }
    }
}

impl RagConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_docs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.docs_dir = dir.into();
        self
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }
}
