//! Splits source text into bounded chunks.
//!
//! Paragraphs (blank-line separated) come first, then sentences, then a hard cut
//! at the character limit. Chunks below `min_chars` are merged forward while the
//! merged text still fits in `max_chars`; the last chunk of a source is kept as is.
//! All lengths are counted in chars, not bytes.

use crate::types::{Chunk, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub min_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 1200, min_chars: 200 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

struct Piece {
    text: String,
    paragraph: usize,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config: ChunkingConfig { max_chars: config.max_chars.max(1), ..config } }
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Chunks every source in order. Chunk indices restart at zero per source.
    pub fn chunk_sources(&self, sources: &[Source]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = sources.iter().flat_map(|s| self.chunk_source(s)).collect();
        tracing::debug!(sources = sources.len(), chunks = chunks.len(), "chunked corpus");
        chunks
    }

    pub fn chunk_source(&self, source: &Source) -> Vec<Chunk> {
        self.split_text(&source.text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { source_id: source.id.clone(), index, text })
            .collect()
    }

    /// The raw splitting policy, without attribution.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        for (paragraph, para) in paragraphs(text).into_iter().enumerate() {
            for text in self.split_paragraph(&para) {
                pieces.push(Piece { text, paragraph });
            }
        }
        self.merge_short(pieces)
    }

    fn split_paragraph(&self, para: &str) -> Vec<String> {
        let max = self.config.max_chars;
        if char_len(para) <= max {
            return vec![para.to_string()];
        }
        let mut out = Vec::new();
        let mut current = String::new();
        for sentence in sentences(para) {
            let len = char_len(sentence);
            if len > max {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                out.extend(hard_split(sentence, max));
                continue;
            }
            if current.is_empty() {
                current.push_str(sentence);
            } else if char_len(&current) + 1 + len <= max {
                current.push(' ');
                current.push_str(sentence);
            } else {
                out.push(std::mem::replace(&mut current, sentence.to_string()));
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }

    fn merge_short(&self, pieces: Vec<Piece>) -> Vec<String> {
        let ChunkingConfig { max_chars, min_chars } = self.config;
        let mut out = Vec::new();
        let mut pending: Option<Piece> = None;
        for piece in pieces {
            pending = Some(match pending.take() {
                None => piece,
                Some(mut prev) => {
                    let sep = if prev.paragraph == piece.paragraph { " " } else { "\n\n" };
                    let prev_len = char_len(&prev.text);
                    if prev_len < min_chars
                        && prev_len + sep.len() + char_len(&piece.text) <= max_chars
                    {
                        prev.text.push_str(sep);
                        prev.text.push_str(&piece.text);
                        prev.paragraph = piece.paragraph;
                        prev
                    } else {
                        out.push(prev.text);
                        piece
                    }
                }
            });
        }
        out.extend(pending.map(|p| p.text));
        out
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Blank-line separated blocks, trimmed, empties dropped.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                out.push(lines.join("\n").trim().to_string());
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        out.push(lines.join("\n").trim().to_string());
    }
    out
}

/// Sentences end at `.`, `!` or `?` followed by whitespace or end of text.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_break = iter.peek().map_or(true, |&(_, next)| next.is_whitespace());
            if at_break {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = end;
            }
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn hard_split(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max)
        .map(|c| c.iter().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
