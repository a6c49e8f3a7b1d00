//! In-memory reference implementations of the four external-collaborator
//! traits, for use by this crate's own tests. Not a production collaborator,
//! this mirrors how the teacher's own test modules stub dependencies inline
//! rather than reaching for a mocking framework.

use crate::error::OrchestratorError;
use crate::score::ToolScore;
use crate::tool::Tool;
use crate::traits::{CacheBackend, EmbeddingModel, ToolRegistry, VectorIndex};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A fixed tool catalog, handed out verbatim.
pub struct InMemoryToolRegistry {
    tools: Vec<Tool>,
}

impl InMemoryToolRegistry {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ToolRegistry for InMemoryToolRegistry {
    async fn get_all_tools(&self) -> Result<Vec<Tool>, OrchestratorError> {
        Ok(self.tools.clone())
    }
}

struct CacheEntry {
    value: Vec<ToolScore>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// A single-map, TTL-respecting cache with no eviction policy, adequate
/// for tests but not for a catalog at production scale.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<ToolScore>>, OrchestratorError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<ToolScore>, ttl: Duration) -> Result<(), OrchestratorError> {
        self.entries.lock().unwrap().insert(key.to_string(), CacheEntry { value, inserted_at: Instant::now(), ttl });
        Ok(())
    }
}

/// A deterministic bag-of-words embedding model: each distinct lowercase
/// word seen gets a stable dimension, and a text's vector counts word
/// occurrences. Captures enough semantic structure (shared vocabulary raises
/// cosine similarity) to exercise scoring/ranking in tests without shipping
/// a real model.
#[derive(Default)]
pub struct BagOfWordsEmbeddingModel {
    vocabulary: Mutex<HashMap<String, usize>>,
}

impl BagOfWordsEmbeddingModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn dimension_for(&self, word: &str) -> usize {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let next = vocabulary.len();
        *vocabulary.entry(word.to_string()).or_insert(next)
    }
}

#[async_trait]
impl EmbeddingModel for BagOfWordsEmbeddingModel {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OrchestratorError> {
        // Pre-register every word first so every vector in this batch (and
        // prior batches) shares one coordinate space.
        for text in texts {
            for word in text.to_lowercase().split_whitespace() {
                self.dimension_for(word);
            }
        }
        let dimension = self.vocabulary.lock().unwrap().len();

        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; dimension];
                for word in text.to_lowercase().split_whitespace() {
                    vector[self.dimension_for(word)] += 1.0;
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.vocabulary.lock().unwrap().len()
    }
}

/// Brute-force L2 nearest-neighbour search over every vector added so far.
#[derive(Default)]
pub struct BruteForceVectorIndex {
    vectors: Mutex<Vec<Vec<f32>>>,
}

impl BruteForceVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0);
            let y = b.get(i).copied().unwrap_or(0.0);
            (x - y).powi(2)
        })
        .sum::<f32>()
        .sqrt()
}

#[async_trait]
impl VectorIndex for BruteForceVectorIndex {
    async fn add(&self, vectors: Vec<Vec<f32>>) -> Result<(), OrchestratorError> {
        self.vectors.lock().unwrap().extend(vectors);
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, OrchestratorError> {
        let vectors = self.vectors.lock().unwrap();
        let mut distances: Vec<(usize, f32)> = vectors.iter().enumerate().map(|(i, v)| (i, l2_distance(query, v))).collect();
        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        distances.truncate(k);
        Ok(distances)
    }
}
