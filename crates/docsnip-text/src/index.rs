use std::collections::{BTreeMap, HashMap};

use docsnip_core::config::IdfWeighting;
use docsnip_core::types::Chunk;

use crate::tokenizer::Tokenizer;

/// IDF for a term seen in `df` of `n` chunks, clamped at zero.
pub fn idf_weight(n: usize, df: usize, weighting: IdfWeighting) -> f64 {
	let (n, df) = (n as f64, df as f64);
	let raw = match weighting {
		IdfWeighting::Smoothed => ((n + 1.0) / (df + 1.0)).ln(),
		IdfWeighting::Classic => (n / (df + 1.0)).ln(),
	};
	raw.max(0.0)
}

/// Raw occurrence counts per term, in term order.
pub fn term_counts(tokens: &[String]) -> BTreeMap<String, usize> {
	let mut counts = BTreeMap::new();
	for t in tokens { *counts.entry(t.clone()).or_insert(0) += 1; }
	counts
}

/// Sparse term -> weight map with a cached L2 norm.
///
/// Ordered so that sums are evaluated in the same order on every build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
	weights: BTreeMap<String, f64>,
	norm: f64,
}

impl TermVector {
	pub fn from_weights(weights: BTreeMap<String, f64>) -> Self {
		let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
		Self { weights, norm }
	}

	pub fn weight(&self, term: &str) -> f64 { self.weights.get(term).copied().unwrap_or(0.0) }
	pub fn norm(&self) -> f64 { self.norm }
	pub fn len(&self) -> usize { self.weights.len() }
	pub fn is_empty(&self) -> bool { self.weights.is_empty() }

	pub fn dot(&self, other: &TermVector) -> f64 {
		let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
		small.weights.iter().map(|(t, w)| w * large.weight(t)).sum()
	}

	/// Cosine similarity in [0, 1]; zero when either side has zero magnitude.
	pub fn cosine(&self, other: &TermVector) -> f64 {
		if self.norm == 0.0 || other.norm == 0.0 { return 0.0; }
		(self.dot(other) / (self.norm * other.norm)).clamp(0.0, 1.0)
	}
}

/// Document frequencies and IDF weights for one corpus.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
	chunk_count: usize,
	doc_freq: HashMap<String, usize>,
	idf: HashMap<String, f64>,
}

impl Vocabulary {
	pub fn build(docs: &[Vec<String>], weighting: IdfWeighting) -> Self {
		let mut doc_freq: HashMap<String, usize> = HashMap::new();
		for tokens in docs {
			for term in term_counts(tokens).into_keys() { *doc_freq.entry(term).or_insert(0) += 1; }
		}
		let n = docs.len();
		let idf = doc_freq.iter().map(|(t, &df)| (t.clone(), idf_weight(n, df, weighting))).collect();
		Self { chunk_count: n, doc_freq, idf }
	}

	pub fn chunk_count(&self) -> usize { self.chunk_count }
	pub fn len(&self) -> usize { self.doc_freq.len() }
	pub fn is_empty(&self) -> bool { self.doc_freq.is_empty() }
	pub fn doc_freq(&self, term: &str) -> usize { self.doc_freq.get(term).copied().unwrap_or(0) }

	/// Zero for terms outside the vocabulary.
	pub fn idf(&self, term: &str) -> f64 { self.idf.get(term).copied().unwrap_or(0.0) }

	/// Length-normalized TF times IDF over `tokens`.
	pub fn weigh(&self, tokens: &[String]) -> TermVector {
		if tokens.is_empty() { return TermVector::default(); }
		let total = tokens.len() as f64;
		let weights = term_counts(tokens)
			.into_iter()
			.map(|(t, c)| { let w = (c as f64 / total) * self.idf(&t); (t, w) })
			.collect();
		TermVector::from_weights(weights)
	}
}

/// A chunk with its term counts and weighted vector.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
	pub chunk: Chunk,
	pub counts: BTreeMap<String, usize>,
	pub vector: TermVector,
}

/// TF-IDF index over the chunks of one retrieval call.
#[derive(Clone)]
pub struct TfIdfIndex {
	chunks: Vec<IndexedChunk>,
	vocabulary: Vocabulary,
	tokenizer: Tokenizer,
}

impl TfIdfIndex {
	/// Builds the index from scratch. Chunks without any term are dropped.
	pub fn build(chunks: Vec<Chunk>, tokenizer: &Tokenizer, weighting: IdfWeighting) -> Self {
		let total = chunks.len();
		let tokenized: Vec<(Chunk, Vec<String>)> = chunks
			.into_iter()
			.map(|c| { let tokens = tokenizer.tokenize(&c.text); (c, tokens) })
			.filter(|(_, tokens)| !tokens.is_empty())
			.collect();
		if tokenized.len() < total {
			tracing::debug!(dropped = total - tokenized.len(), "dropped chunks without terms");
		}
		let docs: Vec<Vec<String>> = tokenized.iter().map(|(_, t)| t.clone()).collect();
		let vocabulary = Vocabulary::build(&docs, weighting);
		let chunks = tokenized
			.into_iter()
			.map(|(chunk, tokens)| {
				let vector = vocabulary.weigh(&tokens);
				let counts = term_counts(&tokens);
				IndexedChunk { chunk, counts, vector }
			})
			.collect::<Vec<_>>();
		tracing::debug!(chunks = chunks.len(), terms = vocabulary.len(), "built tf-idf index");
		Self { chunks, vocabulary, tokenizer: tokenizer.clone() }
	}

	/// True when no chunk survived; scoring reports an empty corpus.
	pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
	pub fn len(&self) -> usize { self.chunks.len() }
	pub fn chunks(&self) -> &[IndexedChunk] { &self.chunks }
	pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
	pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

	/// Tokenizes `query` and weighs it with this corpus' IDF table.
	pub fn query_vector(&self, query: &str) -> (Vec<String>, TermVector) {
		let tokens = self.tokenizer.tokenize(query);
		let vector = self.vocabulary.weigh(&tokens);
		(tokens, vector)
	}
}
