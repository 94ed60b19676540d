//! `Embedder` and `VectorStore`: the two external interfaces spec.md §6
//! names for semantic similarity. Trait shapes are grounded on the teacher's
//! embedding-adapter (`Embedder::embed_batch`, `VectorStore::store/has/
//! find_similar`), extended with the single-vector and id-based query forms
//! the ranker needs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::CoreError;
use crate::graph::PersonId;

#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub id: PersonId,
    pub score: f32,
}

/// Maps text to a fixed-dimension embedding via an external model.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        Ok(self.embed_batch(&[text]).await?.into_iter().next().unwrap_or_default())
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CoreError>;
}

/// Embedding-indexed lookup by id or by query vector.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, id: &PersonId, vector: Vec<f32>) -> Result<(), CoreError>;
    async fn has(&self, id: &PersonId) -> Result<bool, CoreError>;

    /// `query(vector, top_k) -> [{id, score}]`, restricted to persons already
    /// indexed; scores are cosine similarity in `[-1, 1]`.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>, CoreError>;

    /// `query(id, top_k) -> [{id, score}]` for embedding-kNN augmentation
    /// (`augment_with_embedding_edges`).
    async fn query_by_id(&self, id: &PersonId, top_k: usize) -> Result<Vec<ScoredMatch>, CoreError>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// In-process vector store used by default and in tests. A production
/// deployment would point `VectorStoreConfig` at a real index; this crate
/// ships only the interface plus this reference implementation.
#[derive(Default)]
pub struct InMemoryVectorStore {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, id: &PersonId, vector: Vec<f32>) -> Result<(), CoreError> {
        self.vectors
            .write()
            .unwrap()
            .insert(id.as_str().to_string(), vector);
        Ok(())
    }

    async fn has(&self, id: &PersonId) -> Result<bool, CoreError> {
        Ok(self.vectors.read().unwrap().contains_key(id.as_str()))
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>, CoreError> {
        let store = self.vectors.read().unwrap();
        let mut scored: Vec<ScoredMatch> = store
            .iter()
            .map(|(id, v)| ScoredMatch {
                id: PersonId::from(id.clone()),
                score: cosine_similarity(vector, v),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn query_by_id(&self, id: &PersonId, top_k: usize) -> Result<Vec<ScoredMatch>, CoreError> {
        let vector = {
            let store = self.vectors.read().unwrap();
            match store.get(id.as_str()) {
                Some(v) => v.clone(),
                None => return Ok(Vec::new()),
            }
        };
        let mut matches = self.query(&vector, top_k + 1).await?;
        matches.retain(|m| m.id != *id);
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// Deterministic FNV-1a hash embedder, used when the `embeddings` feature
/// is off. No ML model dependencies — grounded on the sibling pack repo's
/// `search::embeddings::HashEmbedder` (same hash-into-bucket-with-sign
/// scheme), adapted to the async `Embedder` trait this crate needs.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn fnv1a_hash_with_salt(seed: u64, salt: u64) -> u64 {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..].copy_from_slice(&salt.to_le_bytes());
    fnv1a_hash(&bytes)
}

fn tokenize_for_hash(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| t.len() >= 2)
        .map(|t| t.to_string())
        .collect()
}

fn accumulate(embedding: &mut [f32], token: &str, weight: f32) {
    let token_hash = fnv1a_hash(token.as_bytes());
    for i in 0..embedding.len() {
        let dim_hash = fnv1a_hash_with_salt(token_hash, i as u64);
        let sign = if dim_hash & 1 == 0 { weight } else { -weight };
        let dim = ((dim_hash >> 1) as usize) % embedding.len();
        embedding[dim] += sign;
    }
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in v.iter_mut() {
            *value /= norm;
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CoreError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

impl HashEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dim];
        if self.dim == 0 {
            return embedding;
        }
        let tokens = tokenize_for_hash(text);
        for token in &tokens {
            accumulate(&mut embedding, token, 1.0);
        }
        for window in tokens.windows(2) {
            let bigram = format!("{} {}", window[0], window[1]);
            accumulate(&mut embedding, &bigram, 0.5);
        }
        l2_normalize(&mut embedding);
        embedding
    }
}

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::*;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Wraps `fastembed::TextEmbedding` in a `Mutex` since its `embed` call
    /// needs `&mut self`, matching the teacher's `FastEmbedEmbedder`.
    pub struct FastEmbedEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedEmbedder {
        pub fn new(model: EmbeddingModel) -> Result<Self, CoreError> {
            let model = TextEmbedding::try_new(InitOptions::new(model))
                .map_err(|e| CoreError::EmbedFailure(e.to_string()))?;
            Ok(Self { model: Mutex::new(model) })
        }

        pub fn default_model() -> Result<Self, CoreError> {
            Self::new(EmbeddingModel::NomicEmbedTextV15)
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CoreError> {
            let mut model = self.model.lock().unwrap();
            let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
            model
                .embed(owned, None)
                .map_err(|e| CoreError::EmbedFailure(e.to_string()))
        }
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_empty_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn in_memory_store_excludes_self_on_id_query() {
        let store = InMemoryVectorStore::new();
        store.upsert(&PersonId::from("P1"), vec![1.0, 0.0]).await.unwrap();
        store.upsert(&PersonId::from("P2"), vec![1.0, 0.0]).await.unwrap();
        let matches = store.query_by_id(&PersonId::from("P1"), 5).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, PersonId::from("P2"));
    }

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("rust backend engineer").await.unwrap();
        let b = embedder.embed("rust backend engineer").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn hash_embedder_similar_text_scores_higher_than_unrelated() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("rust backend engineer").await.unwrap();
        let b = embedder.embed("backend engineer with rust").await.unwrap();
        let c = embedder.embed("oil painting still life").await.unwrap();
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }
}
