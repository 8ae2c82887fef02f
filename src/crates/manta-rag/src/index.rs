//! Vector index: build, persist, load, rank.
//!
//! The index is a flat list of embedded chunks persisted as
//! `index.json` in the store directory. Queries embed the question and
//! rank entries by cosine similarity. JSON keeps the store inspectable
//! with standard tools, and at the corpus sizes this serves (a folder
//! of manuals, not a warehouse) a linear scan is not the bottleneck;
//! the embedding calls are.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use manta_core::EmbeddingModel;

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::{RagError, Result};
use crate::loader::DocumentLoader;
use crate::pdf::PdfTextExtractor;
use crate::splitter::TextSplitter;

/// File name of the persisted index inside the store directory.
pub const INDEX_FILE: &str = "index.json";

/// One embedded chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub text: String,
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub embedding: Vec<f32>,
}

/// The persisted index: embedding model id plus embedded chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Model the entries were embedded with; queries should use the same
    pub embed_model: String,
    pub entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(embed_model: impl Into<String>) -> Self {
        Self {
            embed_model: embed_model.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the index to `{store_dir}/index.json`, creating the
    /// directory if needed.
    pub async fn save(&self, store_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(store_dir).await?;
        let path = store_dir.join(INDEX_FILE);
        let json = serde_json::to_vec(self)?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }

    /// Loads the index from `{store_dir}/index.json`.
    pub async fn load(store_dir: &Path) -> Result<Self> {
        let path = store_dir.join(INDEX_FILE);
        let bytes = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Returns the `k` entries most similar to `query_embedding`,
    /// best first.
    pub fn top_k(&self, query_embedding: &[f32], k: usize) -> Vec<(f32, &IndexEntry)> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Cosine similarity of two vectors; 0.0 for mismatched or zero-norm
/// inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Result of an index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The index was written with this many chunks
    Written { chunks: usize },
    /// Documents were found but none yielded text (scanned or empty
    /// PDFs); nothing was written
    NoText,
}

/// Builds the persisted index from a docs folder.
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingModel>,
    extractor: Arc<dyn PdfTextExtractor>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, extractor: Arc<dyn PdfTextExtractor>) -> Self {
        Self {
            embedder,
            extractor,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Loads, chunks, embeds, and persists the docs under `docs_dir`
    /// into `store_dir`.
    ///
    /// A corpus with documents but no extractable text is a clean
    /// no-op: nothing is written and [`BuildOutcome::NoText`] is
    /// returned so the caller can point the user at the vision path.
    pub async fn build(&self, docs_dir: &Path, store_dir: &Path) -> Result<BuildOutcome> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        let loader = DocumentLoader::new(Arc::clone(&self.extractor));
        let documents = loader.load(docs_dir).await?;
        info!(documents = documents.len(), docs = %docs_dir.display(), "loaded documents");

        let splitter = TextSplitter::new(self.chunk_size, self.chunk_overlap);
        let mut chunks: Vec<(String, PathBuf, Option<u32>)> = Vec::new();
        for document in &documents {
            for piece in splitter.split(&document.text) {
                chunks.push((piece, document.source.clone(), document.page));
            }
        }

        if chunks.is_empty() {
            warn!(docs = %docs_dir.display(), "no text chunks produced; nothing written");
            return Ok(BuildOutcome::NoText);
        }

        let mut index = VectorIndex::new(self.embedder.model_id());
        for (text, source, page) in chunks {
            let embedding = self
                .embedder
                .embed(&text)
                .await
                .map_err(|e| RagError::Embedding(e.to_string()))?;
            index.entries.push(IndexEntry {
                text,
                source,
                page,
                embedding,
            });
        }

        index.save(store_dir).await?;
        info!(chunks = index.len(), store = %store_dir.display(), "index written");
        Ok(BuildOutcome::Written { chunks: index.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CountingEmbedder;

    #[async_trait]
    impl EmbeddingModel for CountingEmbedder {
        async fn embed(&self, text: &str) -> manta_core::Result<Vec<f32>> {
            let alpha = text.matches("alpha").count() as f32;
            let beta = text.matches("beta").count() as f32;
            Ok(vec![alpha, beta, 1.0])
        }

        fn model_id(&self) -> &str {
            "stub-embed"
        }
    }

    struct NoopExtractor;

    #[async_trait]
    impl PdfTextExtractor for NoopExtractor {
        async fn extract_pages(&self, _pdf: &Path) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    fn builder() -> IndexBuilder {
        IndexBuilder::new(Arc::new(CountingEmbedder), Arc::new(NoopExtractor))
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_top_k_orders_by_similarity() {
        let mut index = VectorIndex::new("stub-embed");
        for (name, embedding) in [
            ("far", vec![0.0, 1.0, 0.0]),
            ("near", vec![1.0, 0.0, 0.0]),
            ("middle", vec![0.7, 0.7, 0.0]),
        ] {
            index.entries.push(IndexEntry {
                text: name.to_string(),
                source: PathBuf::from("x.txt"),
                page: None,
                embedding,
            });
        }
        let top = index.top_k(&[1.0, 0.0, 0.0], 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].1.text, "near");
        assert_eq!(top[1].1.text, "middle");
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = VectorIndex::new("stub-embed");
        index.entries.push(IndexEntry {
            text: "hello".to_string(),
            source: PathBuf::from("a.txt"),
            page: Some(2),
            embedding: vec![0.1, 0.2],
        });
        index.save(dir.path()).await.unwrap();

        let loaded = VectorIndex::load(dir.path()).await.unwrap();
        assert_eq!(loaded.embed_model, "stub-embed");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries[0].page, Some(2));
    }

    #[tokio::test]
    async fn test_build_writes_index() {
        let docs = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        std::fs::write(docs.path().join("a.txt"), "alpha alpha beta").unwrap();

        let outcome = builder().build(docs.path(), store.path()).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Written { chunks: 1 });
        assert!(store.path().join(INDEX_FILE).exists());

        let index = VectorIndex::load(store.path()).await.unwrap();
        assert_eq!(index.embed_model, "stub-embed");
        assert_eq!(index.entries[0].embedding, vec![2.0, 1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_build_no_text_writes_nothing() {
        let docs = tempfile::tempdir().unwrap();
        let store_root = tempfile::tempdir().unwrap();
        let store = store_root.path().join("store");
        std::fs::write(docs.path().join("empty.txt"), "   ").unwrap();

        let outcome = builder().build(docs.path(), &store).await.unwrap();
        assert_eq!(outcome, BuildOutcome::NoText);
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_build_missing_docs_errors() {
        let store = tempfile::tempdir().unwrap();
        let err = builder()
            .build(Path::new("/nonexistent/docs"), store.path())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::MissingDocs(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_bad_chunk_params() {
        let docs = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        std::fs::write(docs.path().join("a.txt"), "text").unwrap();

        let err = builder()
            .with_chunk_size(100)
            .with_chunk_overlap(100)
            .build(docs.path(), store.path())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }
}
