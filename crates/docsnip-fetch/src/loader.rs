use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use docsnip_core::error::{Error, FetchError, Result};
use docsnip_core::manifest::{Manifest, ManifestEntry, SourceLocation};
use docsnip_core::traits::PageFetcher;
use docsnip_core::types::{Source, SourceId, SourceKind};

/// A manifest entry that was skipped, with the reason.
#[derive(Debug)]
pub struct LoadFailure {
    pub id: SourceId,
    pub error: Error,
}

/// Sources that resolved, in manifest order, plus the ones that did not.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub sources: Vec<Source>,
    pub failures: Vec<LoadFailure>,
}

pub struct SourceLoader {
    fetcher: Arc<dyn PageFetcher>,
    timeout: Duration,
    concurrent: bool,
}

impl SourceLoader {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher, timeout: Duration::from_secs(8), concurrent: true }
    }

    /// Per-URL bound; an expired fetch counts as a `FetchError`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Loads every entry. Failures are logged and collected, never fatal;
    /// output order follows the manifest regardless of completion order.
    pub async fn load(&self, manifest: &Manifest) -> LoadReport {
        let results: Vec<Result<Source>> = if self.concurrent {
            join_all(manifest.entries().iter().map(|e| self.load_entry(e))).await
        } else {
            let mut out = Vec::with_capacity(manifest.len());
            for entry in manifest.entries() {
                out.push(self.load_entry(entry).await);
            }
            out
        };

        let mut report = LoadReport::default();
        for (entry, result) in manifest.entries().iter().zip(results) {
            match result {
                Ok(source) => report.sources.push(source),
                Err(error) => {
                    tracing::warn!(source = %entry.id, error = %error, "skipping source");
                    report.failures.push(LoadFailure { id: entry.id.clone(), error });
                }
            }
        }
        tracing::info!(
            loaded = report.sources.len(),
            failed = report.failures.len(),
            fetcher = self.fetcher.name(),
            "loaded sources"
        );
        report
    }

    pub async fn load_entry(&self, entry: &ManifestEntry) -> Result<Source> {
        match &entry.location {
            SourceLocation::Path(path) => read_local(&entry.id, path).await,
            SourceLocation::Url(url) => self.fetch_remote(&entry.id, url).await,
        }
    }

    async fn fetch_remote(&self, id: &str, url: &str) -> Result<Source> {
        tracing::debug!(source = %id, fetcher = self.fetcher.name(), "fetching");
        let text = match tokio::time::timeout(self.timeout, self.fetcher.fetch_text(url)).await {
            Ok(Ok(text)) => text,
            Ok(Err(source)) => return Err(Error::Fetch { id: id.to_string(), source }),
            Err(_) => {
                return Err(Error::Fetch { id: id.to_string(), source: FetchError::Timeout(self.timeout) })
            }
        };
        if text.trim().is_empty() {
            return Err(Error::Fetch { id: id.to_string(), source: FetchError::EmptyExtraction });
        }
        Ok(Source::new(id, SourceKind::Remote, text))
    }
}

/// Reads a local file, replacing invalid UTF-8 rather than rejecting the file.
async fn read_local(id: &str, path: &Path) -> Result<Source> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Error::Load { id: id.to_string(), source })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(Source::new(id, SourceKind::Local, text))
}
