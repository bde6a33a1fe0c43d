use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{EmbedError, EmbeddingConfig, EmbeddingSource, endpoint};

/// Ollama `/api/embed` backend.
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    /// Ask Ollama to truncate inputs longer than the model context instead
    /// of failing the request.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: endpoint(&config.api_base, "api/embed"),
            model: config.model.clone(),
        })
    }
}

impl EmbeddingSource for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let req = OllamaEmbedRequest {
            model: &self.model,
            input: vec![text],
            truncate: true,
        };

        let resp = self.client.post(&self.url).json(&req).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(EmbedError::Status {
                provider: "ollama",
                status: status.as_u16(),
                body,
            });
        }

        let body: OllamaEmbedResponse = resp.json()?;
        body.embeddings.into_iter().next().ok_or(EmbedError::Empty)
    }
}
