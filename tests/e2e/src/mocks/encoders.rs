//! Mock Encoders
//!
//! Stand-ins for the remote embedding service and the HuggingFace tokenizer:
//! - `HashingEncoder`: bag-of-words hashed into a small dense space
//! - `CountingEncoder`: wraps another encoder and counts calls
//! - `FailingEncoder` / `SlowEncoder`: error and timeout paths
//! - `WordTokens`: lowercase word tokenizer with sentinels 0 and 1

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sift_core::{DenseEncoder, DenseVector, EmbeddingError, TokenSource};

/// Vocabulary size reported by `WordTokens`
pub const VOCAB_SIZE: usize = 30000;

/// Dimensions of `HashingEncoder` vectors
const DIMENSIONS: usize = 64;

const START_ID: u32 = 0;
const END_ID: u32 = 1;

fn fnv1a(word: &str) -> u32 {
    word.bytes()
        .fold(0x811c9dc5u32, |hash, byte| (hash ^ byte as u32).wrapping_mul(0x01000193))
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Deterministic dense encoder: texts sharing words point the same way
#[derive(Debug, Default)]
pub struct HashingEncoder;

#[async_trait]
impl DenseEncoder for HashingEncoder {
    async fn embed(&self, text: &str) -> Result<DenseVector, EmbeddingError> {
        let mut values = vec![0.0f32; DIMENSIONS];
        for word in words(text) {
            values[fnv1a(&word) as usize % DIMENSIONS] += 1.0;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(DenseVector::new(values))
    }

    fn model_name(&self) -> &str {
        "hashing-test-encoder"
    }
}

/// Counts `embed` calls made through it
pub struct CountingEncoder {
    inner: Arc<dyn DenseEncoder>,
    calls: AtomicUsize,
}

impl CountingEncoder {
    pub fn new(inner: Arc<dyn DenseEncoder>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DenseEncoder for CountingEncoder {
    async fn embed(&self, text: &str) -> Result<DenseVector, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Always fails, like a service rejecting the API key
#[derive(Debug, Default)]
pub struct FailingEncoder;

#[async_trait]
impl DenseEncoder for FailingEncoder {
    async fn embed(&self, _text: &str) -> Result<DenseVector, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed(
            "Embedding service returned 401 Unauthorized".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "failing-test-encoder"
    }
}

/// Answers only after `delay`
#[derive(Debug)]
pub struct SlowEncoder {
    pub delay: Duration,
}

#[async_trait]
impl DenseEncoder for SlowEncoder {
    async fn embed(&self, text: &str) -> Result<DenseVector, EmbeddingError> {
        tokio::time::sleep(self.delay).await;
        HashingEncoder.embed(text).await
    }

    fn model_name(&self) -> &str {
        "slow-test-encoder"
    }
}

/// Word-level token source
///
/// Each lowercase word maps to a stable id in `2..VOCAB_SIZE`; every encoding
/// is wrapped in the start/end sentinels.
#[derive(Debug, Default)]
pub struct WordTokens;

impl WordTokens {
    /// Id a word is assigned
    pub fn id_of(word: &str) -> u32 {
        2 + fnv1a(&word.to_lowercase()) % (VOCAB_SIZE as u32 - 2)
    }
}

impl TokenSource for WordTokens {
    fn encode(&self, text: &str) -> Result<Vec<u32>, EmbeddingError> {
        let mut ids = vec![START_ID];
        ids.extend(words(text).map(|w| Self::id_of(&w)));
        ids.push(END_ID);
        Ok(ids)
    }

    fn sentinel_ids(&self) -> Vec<u32> {
        vec![START_ID, END_ID]
    }

    fn vocab_size(&self) -> usize {
        VOCAB_SIZE
    }
}
