use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use super::{EmbedError, EmbeddingConfig, EmbeddingSource, endpoint};

/// OpenAI-compatible `/embeddings` backend.
///
/// Works with any server that speaks the OpenAI embeddings wire format
/// (OpenAI, vLLM, LM Studio, text-embeddings-inference in OpenAI mode).
pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: endpoint(&config.api_base, "embeddings"),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            dimensions: config.dimensions,
        })
    }
}

impl EmbeddingSource for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
            dimensions: self.dimensions,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(EmbedError::Status {
                provider: "openai",
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp.json()?;
        parse_embedding_response(json)?
            .into_iter()
            .next()
            .ok_or(EmbedError::Empty)
    }
}

/// Parse `{"data": [{"index": n, "embedding": [...]}, ...]}`, ordered by index.
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| EmbedError::InvalidResponse("missing data array".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EmbedError::InvalidResponse("item missing embedding array".into()))?;
        let vector = embedding
            .iter()
            .map(|value| {
                value
                    .as_f64()
                    .map(|n| n as f32)
                    .ok_or_else(|| EmbedError::InvalidResponse("non-numeric embedding value".into()))
            })
            .collect::<Result<Vec<f32>, _>>()?;
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embeddings_in_index_order() {
        let json = serde_json::json!({
            "data": [
                { "index": 1, "embedding": [2.0, 3.0] },
                { "index": 0, "embedding": [0.5, 1.5] }
            ]
        });
        let parsed = parse_embedding_response(json).unwrap();
        assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
    }

    #[test]
    fn missing_data_is_invalid() {
        let json = serde_json::json!({ "error": "nope" });
        assert!(matches!(
            parse_embedding_response(json),
            Err(EmbedError::InvalidResponse(_))
        ));
    }

    #[test]
    fn non_numeric_value_is_invalid() {
        let json = serde_json::json!({ "data": [ { "embedding": [1.0, "x"] } ] });
        assert!(parse_embedding_response(json).is_err());
    }

    #[test]
    fn request_omits_unset_dimensions() {
        let body = EmbeddingRequest {
            model: "m",
            input: vec!["hi"],
            dimensions: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("dimensions").is_none());
        assert_eq!(json["input"][0], "hi");
    }
}
