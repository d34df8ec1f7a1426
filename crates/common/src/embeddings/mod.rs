//! Embedding abstraction
//!
//! The production embedding service is an external collaborator behind the
//! [`Embedder`] trait. [`HashEmbedder`] is a deterministic feature-hashing
//! embedder used by the bundled in-memory index, offline runs and tests.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// Bag-of-words embedder hashing each lower-cased term into a fixed bucket
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(AppError::Embedding {
                message: "embedding dimension must be positive".to_string(),
            });
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, term: &str) -> usize {
        let digest = Sha256::digest(term.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(bytes) % self.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: crate::DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for term in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() > 1)
        {
            let term = term.to_lowercase();
            vector[self.bucket(&term)] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "feature-hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity of two vectors, 0.0 when either is all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_dimension() {
        let embedder = HashEmbedder::new(64).unwrap();
        let embedding = embedder.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let first = embedder.embed("Ultrasonic testing").await.unwrap();
        let second = embedder.embed("ultrasonic TESTING").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_related_texts_score_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("ultrasonic flaw detection").await.unwrap();
        let related = embedder
            .embed("ultrasonic waves reveal flaw indications")
            .await
            .unwrap();
        let unrelated = embedder.embed("course registration deadlines").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch() {
        let embedder = HashEmbedder::new(32).unwrap();
        let texts = vec!["text one".to_string(), "text two".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 32);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashEmbedder::new(0).is_err());
    }

    #[test]
    fn test_cosine_of_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
