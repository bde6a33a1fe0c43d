//! Local sentence-transformer embeddings through fastembed (ONNX Runtime).
//!
//! The model is downloaded once into the docsift cache directory and loaded
//! in-process. No network is needed after the first run.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{EmbedError, EmbeddingConfig, EmbeddingSource};

/// The model the relevance threshold is tuned for.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Map a configured model name to a fastembed model.
///
/// Accepts the sentence-transformers names, with or without the
/// `sentence-transformers/` or `BAAI/` prefix, case-insensitively.
pub fn resolve_model(name: &str) -> Result<EmbeddingModel, EmbedError> {
    let trimmed = name.trim();
    let short = trimmed
        .rsplit_once('/')
        .map_or(trimmed, |(_, model)| model)
        .to_ascii_lowercase();
    match short.as_str() {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        _ => Err(EmbedError::Model(format!(
            "unsupported local model '{trimmed}' (expected {DEFAULT_MODEL}, all-MiniLM-L12-v2, \
             bge-small-en-v1.5 or bge-base-en-v1.5)"
        ))),
    }
}

/// Where downloaded model files live.
pub fn model_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("docsift")
        .join("models")
}

/// In-process sentence embedder.
pub struct FastEmbedEmbedder {
    model: TextEmbedding,
    name: String,
}

impl FastEmbedEmbedder {
    /// Load (downloading on first use) the model named by `config.model`.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let model = resolve_model(&config.model)?;
        let cache_dir = model_cache_dir();
        tracing::debug!(model = %config.model, cache = %cache_dir.display(), "loading local model");

        let options = InitOptions::new(model)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| EmbedError::Model(e.to_string()))?;

        Ok(Self {
            model,
            name: format!("fastembed:{}", config.model),
        })
    }
}

impl EmbeddingSource for FastEmbedEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let vectors = self
            .model
            .embed(vec![text], None)
            .map_err(|e| EmbedError::Model(e.to_string()))?;
        vectors.into_iter().next().ok_or(EmbedError::Empty)
    }
}
