//! Query-time retrieval and the retriever memo table.
//!
//! A [`Retriever`] wraps a loaded index plus an embedding model. Opening
//! one never fails: a missing or unreadable store produces an empty
//! retriever that returns no snippets, which downstream logic reads as
//! "no relevant context" and escalates past. That keeps retrieval
//! failures conversational rather than fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use manta_core::EmbeddingModel;

use crate::index::VectorIndex;

/// One ranked retrieval hit.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub text: String,
    pub source: PathBuf,
    pub page: Option<u32>,
    pub score: f32,
}

/// Similarity search over a persisted index.
pub struct Retriever {
    index: Option<VectorIndex>,
    embedder: Arc<dyn EmbeddingModel>,
    k: usize,
}

impl Retriever {
    /// Opens the index at `store_dir`. Load failures degrade to an
    /// empty retriever with a warning instead of an error.
    pub async fn open(store_dir: &Path, k: usize, embedder: Arc<dyn EmbeddingModel>) -> Self {
        let index = match VectorIndex::load(store_dir).await {
            Ok(index) => {
                if index.embed_model != embedder.model_id() {
                    warn!(
                        index_model = %index.embed_model,
                        query_model = %embedder.model_id(),
                        "index was built with a different embedding model"
                    );
                }
                debug!(store = %store_dir.display(), entries = index.len(), "index loaded");
                Some(index)
            }
            Err(e) => {
                warn!(
                    store = %store_dir.display(),
                    error = %e,
                    "could not load index; retrieval will return no results"
                );
                None
            }
        };
        Self { index, embedder, k }
    }

    /// True when no usable index is loaded.
    pub fn is_empty(&self) -> bool {
        self.index.as_ref().map(|i| i.is_empty()).unwrap_or(true)
    }

    /// Returns up to `k` snippets ranked by similarity to `query`.
    ///
    /// Embedding failures (backend down) also degrade to no snippets;
    /// the caller's empty-result handling covers that case too.
    pub async fn retrieve(&self, query: &str) -> Vec<Snippet> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        if index.is_empty() {
            return Vec::new();
        }

        let query_embedding = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "query embedding failed; returning no snippets");
                return Vec::new();
            }
        };

        index
            .top_k(&query_embedding, self.k)
            .into_iter()
            .map(|(score, entry)| Snippet {
                text: entry.text.clone(),
                source: entry.source.clone(),
                page: entry.page,
                score,
            })
            .collect()
    }
}

type CacheKey = (PathBuf, usize);
type CacheStorage = Arc<RwLock<HashMap<CacheKey, Arc<Retriever>>>>;

/// Process-wide memo table of retrievers keyed by `(store path, k)`.
///
/// Entries are never invalidated: an index rebuilt on disk is not
/// picked up until the process restarts. The table exists so repeated
/// tool calls share one loaded index instead of re-reading and
/// re-parsing the store on every question.
#[derive(Clone, Default)]
pub struct RetrieverCache {
    inner: CacheStorage,
}

impl RetrieverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached retriever for `(store_dir, k)`, opening and
    /// inserting it on first use.
    pub async fn get_or_open(
        &self,
        store_dir: &Path,
        k: usize,
        embedder: &Arc<dyn EmbeddingModel>,
    ) -> Arc<Retriever> {
        let key = (store_dir.to_path_buf(), k);
        {
            let cache = self.inner.read().await;
            if let Some(retriever) = cache.get(&key) {
                return Arc::clone(retriever);
            }
        }

        let retriever = Arc::new(Retriever::open(store_dir, k, Arc::clone(embedder)).await);
        let mut cache = self.inner.write().await;
        // A concurrent opener may have won the race; keep the first.
        Arc::clone(cache.entry(key).or_insert(retriever))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
