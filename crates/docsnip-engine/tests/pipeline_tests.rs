use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use docsnip_core::config::RetrievalSettings;
use docsnip_core::error::FetchError;
use docsnip_core::manifest::Manifest;
use docsnip_core::traits::{PageFetcher, SnippetRetriever};
use docsnip_core::types::{NoMatchReason, Retrieval, Source, NO_SNIPPET};
use docsnip_engine::{IndexCache, Retriever};
use docsnip_fetch::SourceLoader;

/// Answers every URL with the same page and counts calls.
struct CountingFetcher {
    page: String,
    calls: AtomicUsize,
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page.clone())
    }
}

fn counting(page: &str) -> Arc<CountingFetcher> {
    Arc::new(CountingFetcher { page: page.to_string(), calls: AtomicUsize::new(0) })
}

fn retriever(fetcher: Arc<CountingFetcher>) -> Retriever {
    Retriever::new(SourceLoader::new(fetcher), RetrievalSettings::default())
}

fn knowledge_base() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("account.txt"), "reset your password using the link we emailed you").unwrap();
    fs::write(tmp.path().join("billing.txt"), "invoices are billed monthly and refunds take five to seven days").unwrap();
    fs::write(tmp.path().join("index.txt"), "# kb\naccount.txt\nbilling.txt\n").unwrap();
    tmp
}

#[tokio::test]
async fn password_ticket_cites_the_account_doc() {
    let kb = knowledge_base();
    let manifest = Manifest::load(&kb.path().join("index.txt")).unwrap();
    let result = retriever(counting("")).retrieve(&manifest, "how do I reset my password").await;
    let m = result.as_match().expect("match");
    assert_eq!(m.source_id, "account.txt");
    assert_eq!(m.snippet, "reset your password using the link we emailed you");
    assert!(m.score > 0.0 && m.score <= 1.0);
    assert_eq!(result.to_string(), format!("Source: account.txt\n{}", m.snippet));
}

#[tokio::test]
async fn unchanged_manifest_gives_identical_results() {
    let kb = knowledge_base();
    let manifest = Manifest::load(&kb.path().join("index.txt")).unwrap();
    let r = retriever(counting(""));
    let a = r.retrieve(&manifest, "when are refunds billed").await;
    let b = r.retrieve(&manifest, "when are refunds billed").await;
    assert!(a.is_match());
    assert_eq!(a, b);
}

#[tokio::test]
async fn nothing_loadable_is_an_empty_corpus() {
    let tmp = TempDir::new().unwrap();
    let manifest = Manifest::parse("missing.txt\nalso-missing.txt", tmp.path());
    let result = retriever(counting("")).retrieve(&manifest, "password").await;
    assert_eq!(result, Retrieval::no_match(NoMatchReason::EmptyCorpus));
    assert_eq!(result.to_string(), NO_SNIPPET);

    let empty = Manifest::parse("", tmp.path());
    assert_eq!(
        retriever(counting("")).retrieve(&empty, "password").await,
        Retrieval::no_match(NoMatchReason::EmptyCorpus)
    );
}

#[tokio::test]
async fn unrelated_query_is_no_relevant_match() {
    let kb = knowledge_base();
    let manifest = Manifest::load(&kb.path().join("index.txt")).unwrap();
    let result = retriever(counting("")).retrieve(&manifest, "kubernetes ingress controller").await;
    assert_eq!(result, Retrieval::no_match(NoMatchReason::NoRelevantMatch));
}

#[tokio::test]
async fn remote_sources_join_the_corpus() {
    let kb = knowledge_base();
    let manifest = Manifest::parse("account.txt\nhttps://status.example.com/outages", kb.path());
    let fetcher = counting("Scheduled maintenance causes outages every Sunday night.");
    let result = retriever(fetcher.clone()).retrieve(&manifest, "is there an outage on sunday").await;
    assert_eq!(result.as_match().map(|m| m.source_id.as_str()), Some("https://status.example.com/outages"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_reuses_index_until_manifest_changes() {
    let kb = knowledge_base();
    let fetcher = counting("Scheduled maintenance causes outages every Sunday night.");
    let r = retriever(fetcher.clone()).with_cache(IndexCache::new());

    let manifest = Manifest::parse("account.txt\nhttps://status.example.com/outages", kb.path());
    let first = r.retrieve(&manifest, "outages sunday").await;
    let second = r.retrieve(&manifest, "outages sunday").await;
    assert_eq!(first, second);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1, "second call served from cache");

    let changed = Manifest::parse("billing.txt\nhttps://status.example.com/outages", kb.path());
    let third = r.retrieve(&changed, "refunds").await;
    assert_eq!(third.as_match().map(|m| m.source_id.as_str()), Some("billing.txt"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2, "new fingerprint rebuilds");
}

/// Fails the first fetch, then serves `page`.
struct FlakyFetcher {
    page: String,
    calls: AtomicUsize,
}

#[async_trait]
impl PageFetcher for FlakyFetcher {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(FetchError::Network("connection reset".into()));
        }
        Ok(self.page.clone())
    }
}

#[tokio::test]
async fn failed_loads_are_not_cached() {
    let tmp = TempDir::new().unwrap();
    let fetcher = Arc::new(FlakyFetcher {
        page: "Scheduled maintenance causes outages every Sunday night.".into(),
        calls: AtomicUsize::new(0),
    });
    let r = Retriever::new(SourceLoader::new(fetcher.clone()), RetrievalSettings::default())
        .with_cache(IndexCache::new());
    let manifest = Manifest::parse("https://status.example.com/outages", tmp.path());

    let first = r.retrieve(&manifest, "outages sunday").await;
    assert_eq!(first, Retrieval::no_match(NoMatchReason::EmptyCorpus));

    let second = r.retrieve(&manifest, "outages sunday").await;
    assert_eq!(second.as_match().map(|m| m.source_id.as_str()), Some("https://status.example.com/outages"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2, "failed load refetched");

    let third = r.retrieve(&manifest, "outages sunday").await;
    assert_eq!(third, second);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2, "complete load served from cache");
}

#[tokio::test]
async fn works_through_the_trait_object() {
    let kb = knowledge_base();
    let manifest = Manifest::load(&kb.path().join("index.txt")).unwrap();
    let r: Box<dyn SnippetRetriever> = Box::new(retriever(counting("")));
    assert!(r.retrieve(&manifest, "reset password").await.is_match());
}

#[test]
fn long_documents_yield_bounded_snippets() {
    let settings = RetrievalSettings {
        max_chunk_chars: 400,
        min_chunk_chars: 50,
        snippet_chars: 120,
        snippet_slack_chars: 40,
        ..RetrievalSettings::default()
    };
    let filler = "This sentence talks about nothing in particular at all. ".repeat(5);
    let text = format!(
        "{filler}\n\n{filler}Two-factor codes expire after thirty seconds. Request a new code from settings. {filler}"
    );
    let r = Retriever::new(SourceLoader::new(counting("")), settings);
    let result = r.retrieve_from_sources(&[Source::local("security.txt", text.clone())], "two factor code expired");
    let m = result.as_match().expect("match");
    assert!(m.snippet.contains("Two-factor codes expire after thirty seconds."), "{:?}", m.snippet);
    assert!(m.snippet.chars().count() <= 120 + 2 * 40);
    assert!(text.contains(&m.snippet));
}

#[tokio::test]
async fn fixture_corpus_answers_support_questions() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap().to_path_buf();
    let manifest = Manifest::load(&root.join("test_data/documents/index.txt")).unwrap();
    let r = retriever(counting(""));
    let (report, chunks) = r.load_chunks(&manifest).await;
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert!(chunks.iter().all(|c| c.text.chars().count() <= r.settings().max_chunk_chars));

    let refund = r.retrieve(&manifest, "How long does a refund take?").await;
    assert_eq!(refund.as_match().map(|m| m.source_id.as_str()), Some("billing.txt"));
    let password = r.retrieve(&manifest, "I forgot my password and can't log in").await;
    assert_eq!(password.as_match().map(|m| m.source_id.as_str()), Some("account.txt"));
}
