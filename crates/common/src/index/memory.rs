//! In-memory cosine-similarity index

use super::VectorIndex;
use crate::embeddings::{cosine_similarity, Embedder};
use crate::errors::{AppError, Result};
use crate::models::{Passage, ScoredPassage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

struct IndexedPassage {
    passage: Passage,
    embedding: Vec<f32>,
}

/// Brute-force vector index held in process memory
pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<IndexedPassage>>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    #[instrument(skip(self, passages), fields(count = passages.len()))]
    async fn index(&self, passages: &[Passage]) -> Result<()> {
        if passages.is_empty() {
            return Err(AppError::Index {
                message: "no passages provided".to_string(),
            });
        }

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != passages.len() {
            return Err(AppError::Index {
                message: format!(
                    "embedder returned {} vectors for {} passages",
                    embeddings.len(),
                    passages.len()
                ),
            });
        }

        let mut entries = self.entries.write().await;
        entries.extend(
            passages
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(passage, embedding)| IndexedPassage { passage, embedding }),
        );

        debug!(total = entries.len(), "Passages indexed");
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let entries = self.entries.read().await;

        let mut scored: Vec<ScoredPassage> = entries
            .iter()
            .map(|entry| {
                ScoredPassage::new(
                    entry.passage.clone(),
                    cosine_similarity(&query_embedding, &entry.embedding),
                )
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn reset(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
