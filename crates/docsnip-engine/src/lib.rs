//! The retrieval pipeline: load -> chunk -> index -> score -> extract.
//!
//! The index is rebuilt on every call unless an `IndexCache` is attached, in
//! which case it is reused while the manifest fingerprint stays the same.
//! Only indexes built with every source loaded are cached.

mod cache;

use std::sync::Arc;

use async_trait::async_trait;

use docsnip_core::chunker::Chunker;
use docsnip_core::config::{RetrievalSettings, Settings};
use docsnip_core::error::Result;
use docsnip_core::manifest::Manifest;
use docsnip_core::traits::SnippetRetriever;
use docsnip_core::types::{Chunk, Retrieval, Source};
use docsnip_fetch::{loader_from_settings, LoadReport, SourceLoader};
use docsnip_text::{SnippetExtractor, TfIdfIndex, TfIdfSearchEngine, Tokenizer};

pub use cache::IndexCache;

pub struct Retriever {
    loader: SourceLoader,
    chunker: Chunker,
    tokenizer: Tokenizer,
    settings: RetrievalSettings,
    cache: Option<IndexCache>,
}

impl Retriever {
    pub fn new(loader: SourceLoader, settings: RetrievalSettings) -> Self {
        Self {
            loader,
            chunker: Chunker::new(settings.chunking()),
            tokenizer: Tokenizer::with_extra_stop_words(&settings.extra_stop_words),
            settings,
            cache: None,
        }
    }

    /// Wires the fetcher, loader and cache described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let retriever = Self::new(loader_from_settings(&settings.fetch)?, settings.retrieval.clone());
        Ok(if settings.cache.enabled { retriever.with_cache(IndexCache::new()) } else { retriever })
    }

    pub fn with_cache(mut self, cache: IndexCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Loads and chunks every source of `manifest` without indexing.
    pub async fn load_chunks(&self, manifest: &Manifest) -> (LoadReport, Vec<Chunk>) {
        let report = self.loader.load(manifest).await;
        let chunks = self.chunker.chunk_sources(&report.sources);
        (report, chunks)
    }

    pub fn index_sources(&self, sources: &[Source]) -> TfIdfIndex {
        TfIdfIndex::build(self.chunker.chunk_sources(sources), &self.tokenizer, self.settings.idf)
    }

    /// The index for `manifest`: from the cache when the fingerprint matches,
    /// otherwise loaded and built fresh.
    pub async fn index_manifest(&self, manifest: &Manifest) -> Arc<TfIdfIndex> {
        let fingerprint = manifest.fingerprint();
        if let Some(index) = self.cache.as_ref().and_then(|c| c.get(fingerprint)) {
            tracing::debug!(fingerprint, chunks = index.len(), "reusing cached index");
            return index;
        }
        let report = self.loader.load(manifest).await;
        let index = Arc::new(self.index_sources(&report.sources));
        tracing::debug!(
            fingerprint,
            chunks = index.len(),
            terms = index.vocabulary().len(),
            "built index"
        );
        if let Some(cache) = &self.cache {
            if report.failures.is_empty() {
                cache.put(fingerprint, Arc::clone(&index));
            } else {
                tracing::debug!(fingerprint, failed = report.failures.len(), "not caching a partial index");
            }
        }
        index
    }

    pub fn search_index(&self, index: Arc<TfIdfIndex>, query: &str) -> Retrieval {
        let extractor = SnippetExtractor::new(self.settings.snippet_chars, self.settings.snippet_slack_chars);
        let result = TfIdfSearchEngine::new(index, extractor)
            .with_min_score(self.settings.min_score)
            .search(query);
        match &result {
            Retrieval::Match(m) => {
                tracing::info!(source = %m.source_id, chunk = m.chunk_index, score = m.score, "retrieved snippet")
            }
            Retrieval::NoMatch { reason } => tracing::info!(%reason, "no snippet retrieved"),
        }
        result
    }

    /// Runs the in-memory part of the pipeline over already loaded sources.
    pub fn retrieve_from_sources(&self, sources: &[Source], query: &str) -> Retrieval {
        self.search_index(Arc::new(self.index_sources(sources)), query)
    }

    pub async fn retrieve(&self, manifest: &Manifest, query: &str) -> Retrieval {
        let index = self.index_manifest(manifest).await;
        self.search_index(index, query)
    }
}

#[async_trait]
impl SnippetRetriever for Retriever {
    async fn retrieve(&self, manifest: &Manifest, query: &str) -> Retrieval {
        Retriever::retrieve(self, manifest, query).await
    }
}
