//! Text embedding backends.
//!
//! The pipeline only sees the [`EmbeddingSource`] trait. Backends are built
//! once per run from an [`EmbeddingConfig`] and handed to the analyzer by
//! reference, so model setup cost is paid exactly once.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod hash;
#[cfg(feature = "local-embeddings")]
pub mod local;
pub mod ollama;
pub mod openai;

pub use hash::HashEmbedder;
#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    #[error("embedding backend returned no vector")]
    Empty,
    #[error("unknown embedding provider: {0}")]
    UnknownProvider(String),
    #[error("local embedding model error: {0}")]
    Model(String),
    #[cfg(not(feature = "local-embeddings"))]
    #[error("docsift was built without local embedding support (enable the 'local-embeddings' feature)")]
    NoLocalModels,
}

/// A capability that maps text to vectors and compares them.
pub trait EmbeddingSource: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Similarity of two vectors in `[-1, 1]`. Cosine by default.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
}

impl<T: EmbeddingSource + ?Sized> EmbeddingSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(text)
    }

    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        (**self).similarity(a, b)
    }
}

/// Cosine similarity; `0.0` for empty, mismatched or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// all-MiniLM-L6-v2 run in-process through fastembed.
    #[default]
    FastEmbed,
    /// Offline feature-hashing embedder for tests and air-gapped runs.
    Hash,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
    /// Ollama `/api/embed` endpoint.
    Ollama,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastEmbed => "fastembed",
            Self::Hash => "hash",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingProvider {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fastembed" | "local" => Ok(Self::FastEmbed),
            "hash" => Ok(Self::Hash),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(EmbedError::UnknownProvider(other.to_string())),
        }
    }
}

/// Resolved settings for building an embedding backend.
#[derive(Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    /// Requested output dimensions. Sizes the hash embedder; forwarded to
    /// OpenAI-compatible endpoints when set.
    pub dimensions: Option<usize>,
    pub timeout: Duration,
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("dimensions", &self.dimensions)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider(EmbeddingProvider::default())
    }
}

impl EmbeddingConfig {
    /// Provider defaults: model name and API base.
    pub fn for_provider(provider: EmbeddingProvider) -> Self {
        let (model, api_base) = match provider {
            EmbeddingProvider::FastEmbed => ("all-MiniLM-L6-v2", ""),
            EmbeddingProvider::Hash => ("feature-hash", ""),
            EmbeddingProvider::OpenAi => ("text-embedding-3-small", "https://api.openai.com/v1"),
            EmbeddingProvider::Ollama => ("all-minilm", "http://localhost:11434"),
        };
        Self {
            provider,
            model: model.to_string(),
            api_base: api_base.to_string(),
            api_key: None,
            dimensions: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Construct the backend selected by `config`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingSource>, EmbedError> {
    let embedder: Box<dyn EmbeddingSource> = match config.provider {
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::FastEmbed => Box::new(FastEmbedEmbedder::new(config)?),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::FastEmbed => return Err(EmbedError::NoLocalModels),
        EmbeddingProvider::Hash => Box::new(HashEmbedder::new(
            config.dimensions.unwrap_or(hash::DEFAULT_DIMENSIONS),
        )),
        EmbeddingProvider::OpenAi => Box::new(OpenAiEmbedder::new(config)?),
        EmbeddingProvider::Ollama => Box::new(OllamaEmbedder::new(config)?),
    };
    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        "embedding backend ready"
    );
    Ok(embedder)
}

/// Trim an API base so paths can be appended with a single `/`.
pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = [0.3, -0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("FastEmbed".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::FastEmbed);
        assert_eq!("OpenAI".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::OpenAi);
        assert_eq!(" ollama ".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Ollama);
        assert!(matches!(
            "bert".parse::<EmbeddingProvider>(),
            Err(EmbedError::UnknownProvider(_))
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = EmbeddingConfig {
            api_key: Some("sk-secret".into()),
            ..EmbeddingConfig::for_provider(EmbeddingProvider::OpenAi)
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        assert_eq!(
            endpoint("https://api.openai.com/v1/", "/embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(endpoint("http://localhost:11434", "api/embed"), "http://localhost:11434/api/embed");
    }

    #[test]
    fn default_provider_is_minilm() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, EmbeddingProvider::FastEmbed);
        assert_eq!(config.model, "all-MiniLM-L6-v2");
        assert_eq!(config.provider.to_string(), "fastembed");
    }

    #[test]
    fn provider_serializes_lowercase() {
        #[derive(Deserialize)]
        struct Section {
            provider: EmbeddingProvider,
        }
        let parsed: Section = toml::from_str("provider = \"fastembed\"").unwrap();
        assert_eq!(parsed.provider, EmbeddingProvider::FastEmbed);
    }

    #[test]
    fn build_hash_embedder_uses_dimensions() {
        let config = EmbeddingConfig {
            dimensions: Some(64),
            ..EmbeddingConfig::for_provider(EmbeddingProvider::Hash)
        };
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "hash");
        assert_eq!(embedder.embed("hello world").unwrap().len(), 64);
    }
}
