//! docsnip-text
//!
//! In-memory TF-IDF retrieval over chunked text: tokenization (tantivy's
//! analyzer chain), index construction, cosine scoring and snippet extraction.
//! Nothing here persists; an index lives for one retrieval call.

pub mod tokenizer;
pub mod index;
pub mod search;
pub mod snippet;

pub use index::{TermVector, TfIdfIndex, Vocabulary};
pub use search::{ScoreOutcome, SimilarityScorer, TfIdfSearchEngine};
pub use snippet::SnippetExtractor;
pub use tokenizer::Tokenizer;
