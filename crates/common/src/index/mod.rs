//! Vector index abstraction
//!
//! The index is an external, independently synchronized collaborator. This
//! crate only issues `index` and `search` calls against it; persistence and
//! dimension management belong to the implementation.

mod memory;

pub use memory::InMemoryIndex;

use crate::errors::Result;
use crate::models::{Passage, ScoredPassage};
use async_trait::async_trait;

/// Common trait for vector indexes
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Submit passages; `Ok` is the success signal
    async fn index(&self, passages: &[Passage]) -> Result<()>;

    /// Return up to `k` passages ordered by descending relevance
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>>;

    /// Number of stored passages
    async fn count(&self) -> Result<usize>;

    /// Drop every stored passage
    async fn reset(&self) -> Result<()>;

    /// Short backend name for logs and status reports
    fn name(&self) -> &str;
}
