use std::collections::HashSet;
use std::sync::Arc;

use docsnip_core::types::{MatchResult, NoMatchReason, Retrieval};

use crate::index::{IndexedChunk, TermVector, TfIdfIndex};
use crate::snippet::SnippetExtractor;

/// Result of scoring a query against an index, before snippet extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
	/// `position` indexes `TfIdfIndex::chunks()`.
	Best { position: usize, score: f64 },
	EmptyCorpus,
	NoRelevantMatch,
}

/// Cosine scorer over a built index.
///
/// The best chunk is the one with the strictly highest score, so ties resolve to
/// the earliest chunk in load order. A best score of zero, or one below
/// `min_score`, is reported as `NoRelevantMatch`.
pub struct SimilarityScorer<'a> {
	index: &'a TfIdfIndex,
	min_score: f64,
}

impl<'a> SimilarityScorer<'a> {
	pub fn new(index: &'a TfIdfIndex) -> Self { Self { index, min_score: 0.0 } }

	pub fn with_min_score(mut self, min_score: f64) -> Self { self.min_score = min_score; self }

	/// One score per indexed chunk, in index order.
	pub fn scores(&self, query: &TermVector) -> Vec<f64> {
		self.index.chunks().iter().map(|c| query.cosine(&c.vector)).collect()
	}

	pub fn best(&self, query: &str) -> ScoreOutcome {
		let (_, vector) = self.index.query_vector(query);
		self.best_for_vector(&vector)
	}

	pub fn best_for_vector(&self, query: &TermVector) -> ScoreOutcome {
		if self.index.is_empty() { return ScoreOutcome::EmptyCorpus; }
		let mut best: Option<(usize, f64)> = None;
		for (position, score) in self.scores(query).into_iter().enumerate() {
			if best.map_or(true, |(_, s)| score > s) { best = Some((position, score)); }
		}
		match best {
			Some((position, score)) if score > 0.0 && score >= self.min_score => ScoreOutcome::Best { position, score },
			_ => ScoreOutcome::NoRelevantMatch,
		}
	}
}

/// Scores a query against an index and cuts a snippet from the winner.
pub struct TfIdfSearchEngine {
	index: Arc<TfIdfIndex>,
	extractor: SnippetExtractor,
	min_score: f64,
}

impl TfIdfSearchEngine {
	pub fn new(index: impl Into<Arc<TfIdfIndex>>, extractor: SnippetExtractor) -> Self {
		Self { index: index.into(), extractor, min_score: 0.0 }
	}

	pub fn with_min_score(mut self, min_score: f64) -> Self { self.min_score = min_score; self }

	pub fn search(&self, query: &str) -> Retrieval {
		let (tokens, vector) = self.index.query_vector(query);
		match SimilarityScorer::new(&self.index).with_min_score(self.min_score).best_for_vector(&vector) {
			ScoreOutcome::EmptyCorpus => Retrieval::no_match(NoMatchReason::EmptyCorpus),
			ScoreOutcome::NoRelevantMatch => Retrieval::no_match(NoMatchReason::NoRelevantMatch),
			ScoreOutcome::Best { position, score } => {
				let IndexedChunk { chunk, .. } = &self.index.chunks()[position];
				let terms: HashSet<String> = tokens.into_iter().collect();
				let snippet = self.extractor.extract(&chunk.text, &terms, self.index.tokenizer());
				Retrieval::Match(MatchResult {
					source_id: chunk.source_id.clone(),
					chunk_index: chunk.index,
					score,
					snippet: snippet.to_string(),
				})
			}
		}
	}
}
