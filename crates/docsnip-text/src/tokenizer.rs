use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Fixed English stop words removed from both documents and queries.
pub const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	"i","me","my","we","our","us","you","your","yours","she","her","his","him","am","been","were","into","about","any","all",
];

/// A term together with its byte range in the analyzed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSpan {
	pub term: String,
	pub start: usize,
	pub end: usize,
}

/// Splits on every non-alphanumeric character, lower-cases, drops stop words.
///
/// Each call runs on a fresh clone of the analyzer, so output depends on the
/// input text alone.
#[derive(Clone)]
pub struct Tokenizer {
	analyzer: TextAnalyzer,
}

impl Default for Tokenizer {
	fn default() -> Self { Self::new() }
}

impl Tokenizer {
	pub fn new() -> Self { Self::with_extra_stop_words(&[]) }

	pub fn with_extra_stop_words(extra: &[String]) -> Self {
		let words = STOP_WORDS.iter().map(|s| s.to_string()).chain(extra.iter().map(|s| s.to_lowercase()));
		Self { analyzer: build_analyzer(words) }
	}

	pub fn tokenize(&self, text: &str) -> Vec<String> {
		self.spans(text).into_iter().map(|s| s.term).collect()
	}

	pub fn spans(&self, text: &str) -> Vec<TermSpan> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut out = Vec::new();
		while stream.advance() {
			let token = stream.token();
			out.push(TermSpan { term: token.text.clone(), start: token.offset_from, end: token.offset_to });
		}
		out
	}
}

pub fn build_analyzer<I: IntoIterator<Item = String>>(stop_words: I) -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words))
		.build()
}
