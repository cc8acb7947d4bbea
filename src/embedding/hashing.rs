// Feature-hashing embedder: no model, no network, fully deterministic
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use anyhow::Result;

use super::Embedder;

/// Default vector length for the hashing embedder
pub const DEFAULT_HASH_DIMENSION: usize = 256;

/// Signed feature hashing of lowercase word tokens
///
/// Each token adds ±1 to one bucket; the result is L2-normalised. Text with
/// no alphanumeric tokens maps to the zero vector.
///
/// Buckets come from `DefaultHasher`, whose algorithm std may change between
/// releases. Vectors are stable for one build, not across toolchains, so
/// they must not be persisted or compared between binaries.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            anyhow::bail!("Hash embedder dimension must be greater than zero");
        }
        Ok(Self { dimension })
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let h = hasher.finish();
        let index = (h % self.dimension as u64) as usize;
        let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASH_DIMENSION,
        }
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in Self::tokens(text) {
            let (index, sign) = self.bucket(&token);
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }

    fn name(&self) -> &str {
        "feature-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_dimension() {
        let embedder = HashEmbedder::new(64).unwrap();
        assert_eq!(embedder.embed("short").unwrap().len(), 64);
        assert_eq!(embedder.embed("a much longer piece of text").unwrap().len(), 64);
        assert_eq!(embedder.dimension(), 64);
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Software Engineering Body of Knowledge").unwrap();
        let b = embedder.embed("Software Engineering Body of Knowledge").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Testing, testing!").unwrap();
        let b = embedder.embed("testing testing").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_norm() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("requirements elicitation and analysis").unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("  ... ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }
}
