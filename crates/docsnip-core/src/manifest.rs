//! Source manifests: one identifier per line, `#` comments and blank lines ignored.
//!
//! Relative paths resolve against the manifest's own directory, so a manifest can
//! be moved together with the documents it lists.

use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use twox_hash::XxHash64;

use crate::config::resolve_with_base;
use crate::error::{Error, Result};
use crate::types::{SourceId, SourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Path(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// The identifier exactly as written, used for citations.
    pub id: SourceId,
    pub location: SourceLocation,
}

impl ManifestEntry {
    pub fn resolve(id: &str, base: &Path) -> Self {
        let id = id.trim();
        let location = match SourceKind::of(id) {
            SourceKind::Remote => SourceLocation::Url(id.to_string()),
            SourceKind::Local => SourceLocation::Path(resolve_with_base(base, id)),
        };
        Self { id: id.to_string(), location }
    }

    pub fn kind(&self) -> SourceKind {
        match self.location {
            SourceLocation::Path(_) => SourceKind::Local,
            SourceLocation::Url(_) => SourceKind::Remote,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    fingerprint: u64,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|source| Error::Manifest { path: path.to_path_buf(), source })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let manifest = Self::parse(&contents, base);
        tracing::debug!(manifest = %path.display(), entries = manifest.len(), "loaded manifest");
        Ok(manifest)
    }

    pub fn parse(contents: &str, base: &Path) -> Self {
        Self::from_ids(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
            base,
        )
    }

    pub fn from_ids<I, S>(ids: I, base: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<ManifestEntry> = ids
            .into_iter()
            .filter(|id| !id.as_ref().trim().is_empty())
            .map(|id| ManifestEntry::resolve(id.as_ref(), base))
            .collect();
        let fingerprint = fingerprint_entries(&entries);
        Self { entries, fingerprint }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// xxHash64 over the resolved entries. Comment or whitespace edits keep it stable.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn fingerprint_entries(entries: &[ManifestEntry]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for entry in entries {
        match &entry.location {
            SourceLocation::Path(p) => hasher.write(p.to_string_lossy().as_bytes()),
            SourceLocation::Url(u) => hasher.write(u.as_bytes()),
        }
        hasher.write_u8(b'\n');
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines_and_keeps_order() {
        let text = "# knowledge base\n\nfaq.txt\n  https://example.com/billing  \n# trailing\nguides/setup.md\n";
        let manifest = Manifest::parse(text, Path::new("/kb"));
        let ids: Vec<&str> = manifest.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["faq.txt", "https://example.com/billing", "guides/setup.md"]);
        assert_eq!(manifest.entries()[0].location, SourceLocation::Path(PathBuf::from("/kb/faq.txt")));
        assert_eq!(manifest.entries()[1].kind(), SourceKind::Remote);
    }

    #[test]
    fn fingerprint_ignores_comments_but_tracks_entries() {
        let a = Manifest::parse("a.txt\nb.txt\n", Path::new("/kb"));
        let b = Manifest::parse("# note\na.txt\n\nb.txt", Path::new("/kb"));
        let c = Manifest::parse("b.txt\na.txt\n", Path::new("/kb"));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let err = Manifest::load(Path::new("/definitely/not/here/index.txt")).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }
}
