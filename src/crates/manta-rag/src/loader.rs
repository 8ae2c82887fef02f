//! Document loading.
//!
//! Walks the docs folder for `.txt`, `.md`, and `.pdf` files. Plain
//! text and markdown load as one document per file; PDFs load as one
//! document per page so retrieval hits can cite a page number.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{RagError, Result};
use crate::pdf::PdfTextExtractor;

/// A loaded document before chunking.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub text: String,
    pub source: PathBuf,
    /// 1-based page number, set for PDF pages only
    pub page: Option<u32>,
}

/// Loads source documents from a folder tree.
pub struct DocumentLoader {
    extractor: Arc<dyn PdfTextExtractor>,
}

impl DocumentLoader {
    pub fn new(extractor: Arc<dyn PdfTextExtractor>) -> Self {
        Self { extractor }
    }

    /// Loads every supported file under `docs_dir`.
    ///
    /// Fails when the folder is missing or contains no supported files
    /// at all. Unreadable PDFs are skipped with a warning so one broken
    /// file cannot sink a whole indexing run; empty page texts are kept
    /// so the caller can distinguish "no documents" from "documents
    /// without extractable text".
    pub async fn load(&self, docs_dir: &Path) -> Result<Vec<RawDocument>> {
        if !docs_dir.is_dir() {
            return Err(RagError::MissingDocs(docs_dir.to_path_buf()));
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(docs_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());

            match extension.as_deref() {
                Some("txt") | Some("md") => {
                    let text = tokio::fs::read_to_string(path).await?;
                    documents.push(RawDocument {
                        text,
                        source: path.to_path_buf(),
                        page: None,
                    });
                }
                Some("pdf") => match self.extractor.extract_pages(path).await {
                    Ok(pages) => {
                        for (i, text) in pages.into_iter().enumerate() {
                            documents.push(RawDocument {
                                text,
                                source: path.to_path_buf(),
                                page: Some(i as u32 + 1),
                            });
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable PDF");
                    }
                },
                _ => {}
            }
        }

        if documents.is_empty() {
            return Err(RagError::NoDocuments(docs_dir.to_path_buf()));
        }
        debug!(count = documents.len(), "loaded documents");
        Ok(documents)
    }
}
