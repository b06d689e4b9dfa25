//! Picks the densest query-term window of a chunk and widens it to sentence
//! boundaries. Output is always a slice of the input.

use std::collections::HashSet;

use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetExtractor {
	target_chars: usize,
	slack_chars: usize,
}

impl Default for SnippetExtractor {
	fn default() -> Self { Self::new(800, 160) }
}

impl SnippetExtractor {
	/// `slack_chars` bounds how far each edge may move to reach a sentence boundary.
	pub fn new(target_chars: usize, slack_chars: usize) -> Self {
		Self { target_chars: target_chars.max(1), slack_chars }
	}

	pub fn extract<'t>(&self, text: &'t str, query_terms: &HashSet<String>, tokenizer: &Tokenizer) -> &'t str {
		let chars: Vec<(usize, char)> = text.char_indices().collect();
		let n = chars.len();
		if n <= self.target_chars { return text; }

		let char_of_byte = |b: usize| chars.partition_point(|&(o, _)| o < b);
		let hits: Vec<(usize, usize)> = tokenizer
			.spans(text)
			.into_iter()
			.filter(|s| query_terms.contains(&s.term))
			.map(|s| (char_of_byte(s.start), char_of_byte(s.end)))
			.collect();

		let cs: Vec<char> = chars.iter().map(|&(_, c)| c).collect();
		let start = densest_window(&hits, self.target_chars, n);
		let first_hit = hits.iter().map(|&(s, _)| s).find(|&s| s >= start);
		let start = self.snap_start(&cs, start, first_hit);
		let end = self.snap_end(&cs, start, (start + self.target_chars).min(n));
		let byte = |ci: usize| if ci >= n { text.len() } else { chars[ci].0 };
		text[byte(start)..byte(end)].trim()
	}

	/// Moves `start` to the nearest sentence start within the slack, never past
	/// the first hit; failing that, to the next word start.
	fn snap_start(&self, cs: &[char], start: usize, first_hit: Option<usize>) -> usize {
		if start == 0 { return 0; }
		let n = cs.len();
		let back = (start.saturating_sub(self.slack_chars)..=start).rev().find(|&k| is_sentence_start(cs, k));
		let cap = first_hit.map_or(start + self.slack_chars, |h| h.min(start + self.slack_chars)).min(n);
		let fwd = (start..=cap).find(|&k| k < n && is_sentence_start(cs, k));
		match (back, fwd) {
			(Some(b), Some(f)) => if start - b <= f - start { b } else { f },
			(Some(b), None) => b,
			(None, Some(f)) => f,
			(None, None) => (start..cap).find(|&k| is_word_start(cs, k)).unwrap_or(start),
		}
	}

	fn snap_end(&self, cs: &[char], start: usize, end: usize) -> usize {
		let n = cs.len();
		if end >= n { return n; }
		let forward = (end + self.slack_chars).min(n);
		if let Some(k) = (end..=forward).find(|&k| is_sentence_end(cs, k)) { return k; }
		let floor = end.saturating_sub(self.slack_chars).max(start + 1);
		if let Some(k) = (floor..end).rev().find(|&k| is_sentence_end(cs, k)) { return k; }
		(floor..end).rev().find(|&k| cs[k].is_whitespace()).unwrap_or(end)
	}
}

fn is_terminator(c: char) -> bool { matches!(c, '.' | '!' | '?') }

fn is_sentence_start(cs: &[char], k: usize) -> bool {
	k == 0 || cs[k - 1] == '\n' || (cs[k - 1].is_whitespace() && k >= 2 && is_terminator(cs[k - 2]))
}

fn is_word_start(cs: &[char], k: usize) -> bool {
	k == 0 || (cs[k - 1].is_whitespace() && !cs[k].is_whitespace())
}

fn is_sentence_end(cs: &[char], k: usize) -> bool {
	k == cs.len() || cs[k] == '\n' || (k >= 1 && is_terminator(cs[k - 1]) && cs[k].is_whitespace())
}

/// Start (in chars) of the `width`-char window holding the most hits, with the
/// hit cluster roughly centred. Falls back to the beginning when nothing matched.
fn densest_window(hits: &[(usize, usize)], width: usize, n: usize) -> usize {
	let mut best: Option<(usize, usize, usize)> = None; // (count, first, last_end)
	let mut j = 0;
	for (i, &(first, _)) in hits.iter().enumerate() {
		j = j.max(i);
		while j < hits.len() && hits[j].1 <= first + width { j += 1; }
		let count = j - i;
		if count > 0 && best.map_or(true, |(c, _, _)| count > c) { best = Some((count, first, hits[j - 1].1)); }
	}
	let Some((_, first, last_end)) = best else { return 0 };
	let spare = width.saturating_sub(last_end - first);
	first.saturating_sub(spare / 2).min(n.saturating_sub(width))
}
