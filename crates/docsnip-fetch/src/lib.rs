//! docsnip-fetch
//!
//! Resolves manifest entries into loaded sources. Local paths are read directly;
//! URLs go through a `PageFetcher` collaborator (plain HTTP or Firecrawl).

pub mod firecrawl;
pub mod http;
pub mod loader;

use std::sync::Arc;

use docsnip_core::config::{FetchProvider, FetchSettings};
use docsnip_core::error::Result;
use docsnip_core::traits::PageFetcher;

pub use firecrawl::FirecrawlFetcher;
pub use http::{HtmlCleaner, HttpFetcher};
pub use loader::{LoadFailure, LoadReport, SourceLoader};

/// Builds the fetcher selected by `fetch.provider`.
pub fn fetcher_from_settings(settings: &FetchSettings) -> Result<Arc<dyn PageFetcher>> {
    Ok(match settings.provider {
        FetchProvider::Http => Arc::new(HttpFetcher::new(settings)?),
        FetchProvider::Firecrawl => Arc::new(FirecrawlFetcher::new(settings)?),
    })
}

/// Loader configured from settings: provider, timeout and concurrency.
pub fn loader_from_settings(settings: &FetchSettings) -> Result<SourceLoader> {
    Ok(SourceLoader::new(fetcher_from_settings(settings)?)
        .with_timeout(settings.timeout())
        .with_concurrency(settings.concurrent))
}
