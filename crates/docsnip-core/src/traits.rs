use async_trait::async_trait;

use crate::error::FetchError;
use crate::manifest::Manifest;
use crate::types::Retrieval;

/// External text-extraction service for remote sources.
///
/// Implementations return plain text; HTML handling, if any, is theirs.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// The surface the surrounding workflow calls: manifest + query in, tagged result out.
#[async_trait]
pub trait SnippetRetriever: Send + Sync {
    async fn retrieve(&self, manifest: &Manifest, query: &str) -> Retrieval;
}
