use super::{EmbedError, EmbeddingSource};

pub const DEFAULT_DIMENSIONS: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Offline bag-of-words embedder using the hashing trick.
///
/// Tokens are lower-cased alphanumeric runs. Each token is hashed with
/// FNV-1a; the low bits pick a bucket and the top bit picks the sign. The
/// result is L2-normalized, so cosine similarity reduces to a dot product
/// over shared vocabulary. Deterministic across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl EmbeddingSource for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_output() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Plan a trip for college friends").unwrap();
        let b = embedder.embed("Plan a trip for college friends").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("Beaches, nightlife!").unwrap();
        let b = embedder.embed("beaches nightlife").unwrap();
        assert!((embedder.similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("vegetarian dinner menu").unwrap();
        let close = embedder.embed("a vegetarian menu for a buffet dinner").unwrap();
        let far = embedder.embed("filling forms in acrobat").unwrap();
        assert!(embedder.similarity(&query, &close) > embedder.similarity(&query, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("  ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn output_is_unit_length() {
        let embedder = HashEmbedder::new(32);
        let v = embedder.embed("one two three four five").unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
