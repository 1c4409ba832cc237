//! Hashed n-gram embeddings
//!
//! Produces fixed-length float32 vectors from arbitrary strings by hashing
//! character n-grams into a fixed number of buckets and L2-normalizing the
//! counts. Deterministic and local (no model download, no network), so
//! vector search is exercisable in tests. Cosine similarity is the intended
//! retrieval metric.

use std::collections::HashMap;

use thiserror::Error;

/// Default embedding dimension.
pub const DEFAULT_DIM: usize = 128;

/// Default n-gram width.
pub const DEFAULT_NGRAM: usize = 3;

/// Norms below this are left unnormalized.
const NORM_EPSILON: f32 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    #[error("cannot vectorize empty input")]
    EmptyInput,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Character n-gram vectorizer with hashed buckets.
#[derive(Debug, Clone)]
pub struct NgramVectorizer {
    dim: usize,
    ngram: usize,
}

impl NgramVectorizer {
    pub fn new(dim: usize, ngram: usize) -> Self {
        Self { dim, ngram }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a string. Same input yields the same vector.
    pub fn vectorize(&self, input: &str) -> Result<Vec<f32>, VectorError> {
        let text = input.trim().to_lowercase();
        if text.is_empty() {
            return Err(VectorError::EmptyInput);
        }

        let chars: Vec<char> = text.chars().collect();
        let mut counts: HashMap<String, u32> = HashMap::new();
        if chars.len() < self.ngram {
            *counts.entry(text).or_insert(0) += 1;
        } else {
            for window in chars.windows(self.ngram) {
                let gram: String = window.iter().collect();
                *counts.entry(gram).or_insert(0) += 1;
            }
        }

        let mut vector = vec![0.0f32; self.dim];
        for (gram, count) in counts {
            let index = (fnv1a32(gram.as_bytes()) as usize) % self.dim;
            vector[index] += count as f32;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }
}

impl Default for NgramVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIM, DEFAULT_NGRAM)
    }
}

/// FNV-1a 32-bit hash.
fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

/// Normalize in place; vectors with near-zero norm are left unchanged.
fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > NORM_EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity between two vectors of equal dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= NORM_EPSILON || norm_b <= NORM_EPSILON {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
