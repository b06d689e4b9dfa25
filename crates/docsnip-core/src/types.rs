//! Domain types shared by the loader, the text engine and the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type SourceId = String;

/// Text handed to callers when retrieval produced nothing to cite.
pub const NO_SNIPPET: &str = "No doc snippet available.";

/// Where a source lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
}

impl SourceKind {
    /// Classifies a manifest identifier. Only fully-qualified http(s) URLs are remote.
    pub fn of(id: &str) -> Self {
        let lower = id.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceKind::Remote
        } else {
            SourceKind::Local
        }
    }
}

/// A loaded knowledge-base entry. Never mutated after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub kind: SourceKind,
    pub text: String,
}

impl Source {
    pub fn new(id: impl Into<SourceId>, kind: SourceKind, text: impl Into<String>) -> Self {
        Self { id: id.into(), kind, text: text.into() }
    }

    pub fn local(id: impl Into<SourceId>, text: impl Into<String>) -> Self {
        Self::new(id, SourceKind::Local, text)
    }

    pub fn remote(id: impl Into<SourceId>, text: impl Into<String>) -> Self {
        Self::new(id, SourceKind::Remote, text)
    }
}

/// A bounded excerpt of exactly one source, the unit that gets indexed.
///
/// - `source_id`: identifier of the parent source as written in the manifest
/// - `index`: zero-based position within the parent source
/// - `text`: the chunk payload, never longer than the configured maximum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_id: SourceId,
    pub index: usize,
    pub text: String,
}

/// The winning chunk of a retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source_id: SourceId,
    pub chunk_index: usize,
    pub score: f64,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No source loaded, or the loaded sources produced no indexable chunk.
    EmptyCorpus,
    /// A corpus exists but nothing scored above the threshold.
    NoRelevantMatch,
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatchReason::EmptyCorpus => f.write_str("empty corpus"),
            NoMatchReason::NoRelevantMatch => f.write_str("no relevant match"),
        }
    }
}

/// Outcome of one retrieval call: a match or an explicit no-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Retrieval {
    Match(MatchResult),
    NoMatch { reason: NoMatchReason },
}

impl Retrieval {
    pub fn no_match(reason: NoMatchReason) -> Self {
        Retrieval::NoMatch { reason }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Retrieval::Match(_))
    }

    pub fn as_match(&self) -> Option<&MatchResult> {
        match self {
            Retrieval::Match(m) => Some(m),
            Retrieval::NoMatch { .. } => None,
        }
    }
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retrieval::Match(m) => write!(f, "Source: {}\n{}", m.source_id, m.snippet),
            Retrieval::NoMatch { .. } => f.write_str(NO_SNIPPET),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_identifiers() {
        assert_eq!(SourceKind::of("https://example.com/faq"), SourceKind::Remote);
        assert_eq!(SourceKind::of("HTTP://example.com"), SourceKind::Remote);
        assert_eq!(SourceKind::of("/docs/billing.txt"), SourceKind::Local);
        assert_eq!(SourceKind::of("httpdocs/readme.txt"), SourceKind::Local);
    }

    #[test]
    fn renders_citation_and_sentinel() {
        let hit = Retrieval::Match(MatchResult {
            source_id: "faq.txt".into(),
            chunk_index: 0,
            score: 0.5,
            snippet: "Reset it here.".into(),
        });
        assert_eq!(hit.to_string(), "Source: faq.txt\nReset it here.");
        assert_eq!(Retrieval::no_match(NoMatchReason::EmptyCorpus).to_string(), NO_SNIPPET);
    }

    #[test]
    fn serializes_as_tagged_outcome() {
        let value = serde_json::to_value(Retrieval::no_match(NoMatchReason::NoRelevantMatch)).unwrap();
        assert_eq!(value["outcome"], "no_match");
        assert_eq!(value["reason"], "no_relevant_match");
    }
}
