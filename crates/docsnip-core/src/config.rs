//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `DOCSNIP_*` env vars
//! (`__` separates nested keys, e.g. `DOCSNIP_FETCH__TIMEOUT_SECS=3`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chunker::ChunkingConfig;
use crate::error::Error;

const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_secs(2);

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("DOCSNIP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Wraps an already-assembled figment, mostly for tests and embedding callers.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    /// Parses configuration from a TOML string with no file or env layers.
    pub fn from_toml_str(toml: &str) -> Self {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extracts and validates the typed settings. Missing sections fall back to defaults.
    pub fn settings(&self) -> crate::error::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub fetch: FetchSettings,
    pub cache: CacheSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        let r = &self.retrieval;
        if r.max_chunk_chars == 0 {
            return Err(Error::InvalidConfig("retrieval.max_chunk_chars must be positive".into()));
        }
        if r.min_chunk_chars > r.max_chunk_chars {
            return Err(Error::InvalidConfig(format!(
                "retrieval.min_chunk_chars ({}) exceeds max_chunk_chars ({})",
                r.min_chunk_chars, r.max_chunk_chars
            )));
        }
        if r.snippet_chars == 0 {
            return Err(Error::InvalidConfig("retrieval.snippet_chars must be positive".into()));
        }
        if !(0.0..=1.0).contains(&r.min_score) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.min_score must lie in [0, 1], got {}",
                r.min_score
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(Error::InvalidConfig("fetch.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

/// How inverse document frequency is derived from document frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfWeighting {
    /// `max(0, ln((N + 1) / (df + 1)))`
    #[default]
    Smoothed,
    /// `max(0, ln(N / (df + 1)))`
    Classic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub manifest: String,
    pub max_chunk_chars: usize,
    pub min_chunk_chars: usize,
    pub snippet_chars: usize,
    pub snippet_slack_chars: usize,
    pub min_score: f64,
    pub idf: IdfWeighting,
    pub extra_stop_words: Vec<String>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            manifest: "documents/index.txt".to_string(),
            max_chunk_chars: 1200,
            min_chunk_chars: 200,
            snippet_chars: 800,
            snippet_slack_chars: 160,
            min_score: 0.0,
            idf: IdfWeighting::default(),
            extra_stop_words: Vec::new(),
        }
    }
}

impl RetrievalSettings {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig { max_chars: self.max_chunk_chars, min_chars: self.min_chunk_chars }
    }

    pub fn manifest_path(&self) -> PathBuf {
        expand_path(&self.manifest)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchProvider {
    #[default]
    Http,
    Firecrawl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub provider: FetchProvider,
    pub timeout_secs: u64,
    pub concurrent: bool,
    pub user_agent: String,
    pub firecrawl_base_url: String,
    pub firecrawl_api_key: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            provider: FetchProvider::default(),
            timeout_secs: 8,
            concurrent: true,
            user_agent: concat!("docsnip/", env!("CARGO_PKG_VERSION")).to_string(),
            firecrawl_base_url: "https://api.firecrawl.dev".to_string(),
            firecrawl_api_key: None,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// HTTP client deadline. Outlasts `timeout()` so the loader's own deadline
    /// fires first and a slow page surfaces as `FetchError::Timeout`.
    pub fn client_timeout(&self) -> Duration {
        self.timeout() + CLIENT_TIMEOUT_GRACE
    }

    /// API key from configuration, else from `FIRECRAWL_API_KEY`.
    pub fn firecrawl_key(&self) -> Option<String> {
        self.firecrawl_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env::var("FIRECRAWL_API_KEY").ok().filter(|k| !k.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
