//! Sparse Term-Frequency Vectors
//!
//! Tokenizes text with a fixed vocabulary and counts token ids. The two
//! sentinel ids (sequence start / end) are stripped so every query does not
//! share the same two "terms".

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokenizers::tokenizer::{Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};

use super::EmbeddingError;

/// Maximum number of tokens considered per text
pub const MAX_SPARSE_TOKENS: usize = 4096;

/// Candidate names for the sequence-start sentinel, most common first
const START_TOKENS: &[&str] = &["[CLS]", "<s>", "<|begin_of_text|>", "<bos>"];

/// Candidate names for the sequence-end sentinel
const END_TOKENS: &[&str] = &["[SEP]", "</s>", "<|end_of_text|>", "<eos>"];

// ============================================================================
// SPARSE VECTOR
// ============================================================================

/// Token id -> weight, ordered by token id
///
/// Only positive weights are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: BTreeMap<u32, f32>,
}

impl SparseVector {
    /// Empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(id, weight)` pairs, dropping non-positive weights
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, f32)>) -> Self {
        Self {
            entries: entries.into_iter().filter(|(_, w)| *w > 0.0).collect(),
        }
    }

    /// Count token ids, skipping the given sentinels
    pub fn from_token_ids(ids: &[u32], skip: &[u32]) -> Self {
        let mut entries: BTreeMap<u32, f32> = BTreeMap::new();
        for id in ids.iter().filter(|id| !skip.contains(id)) {
            *entries.entry(*id).or_default() += 1.0;
        }
        Self { entries }
    }

    /// Number of non-zero elements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no term survived tokenization
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight of a token id
    pub fn get(&self, id: u32) -> Option<f32> {
        self.entries.get(&id).copied()
    }

    /// Iterate in ascending token id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.entries.iter().map(|(id, w)| (*id, *w))
    }

    /// Sparse dot product
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .entries
            .iter()
            .filter_map(|(id, w)| large.entries.get(id).map(|v| w * v))
            .sum()
    }

    /// Serialize as `{id:weight,...}/vocab_size`
    pub fn to_wire(&self, vocab_size: usize) -> String {
        super::format_sparse(self, vocab_size)
    }
}

// ============================================================================
// TOKEN SOURCE
// ============================================================================

/// The tokenizer collaborator
pub trait TokenSource: Send + Sync {
    /// Encode text into token ids, truncated to `MAX_SPARSE_TOKENS`
    fn encode(&self, text: &str) -> Result<Vec<u32>, EmbeddingError>;

    /// Sequence start / end sentinel ids that never count as terms
    fn sentinel_ids(&self) -> Vec<u32>;

    /// Size of the base vocabulary
    fn vocab_size(&self) -> usize;
}

/// HuggingFace `tokenizer.json` backed token source
#[derive(Clone)]
pub struct HfTokenizer {
    tokenizer: Tokenizer,
    sentinels: Vec<u32>,
    vocab_size: usize,
}

impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file
    pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            EmbeddingError::TokenizerUnavailable(format!(
                "Failed to load tokenizer from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::configure(tokenizer, max_length)
    }

    /// Load a tokenizer from serialized JSON bytes
    pub fn from_bytes(bytes: impl AsRef<[u8]>, max_length: usize) -> Result<Self, EmbeddingError> {
        let tokenizer = Tokenizer::from_bytes(bytes).map_err(|e| {
            EmbeddingError::TokenizerUnavailable(format!("Failed to deserialize tokenizer: {}", e))
        })?;
        Self::configure(tokenizer, max_length)
    }

    fn configure(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self, EmbeddingError> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                stride: 0,
                strategy: TruncationStrategy::LongestFirst,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| {
                EmbeddingError::TokenizerUnavailable(format!(
                    "Failed to configure tokenizer truncation: {}",
                    e
                ))
            })?;

        let lookup = |names: &[&str]| names.iter().find_map(|name| tokenizer.token_to_id(name));
        let sentinels: Vec<u32> = [lookup(START_TOKENS), lookup(END_TOKENS)]
            .into_iter()
            .flatten()
            .collect();
        let vocab_size = tokenizer.get_vocab_size(false);

        tracing::debug!(vocab_size, sentinels = ?sentinels, "Tokenizer loaded");

        Ok(Self {
            tokenizer,
            sentinels,
            vocab_size,
        })
    }
}

impl TokenSource for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::TokenizationFailed(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn sentinel_ids(&self) -> Vec<u32> {
        self.sentinels.clone()
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

// ============================================================================
// SPARSE ENCODER
// ============================================================================

/// Text -> term-frequency `SparseVector`
///
/// Deterministic for a fixed tokenizer. Cheap to clone.
#[derive(Clone)]
pub struct SparseEncoder {
    tokens: Arc<dyn TokenSource>,
}

impl SparseEncoder {
    /// Wrap a token source
    pub fn new(tokens: impl TokenSource + 'static) -> Self {
        Self {
            tokens: Arc::new(tokens),
        }
    }

    /// Load the HuggingFace tokenizer at `path`
    pub fn from_tokenizer_file(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        Ok(Self::new(HfTokenizer::from_file(path, MAX_SPARSE_TOKENS)?))
    }

    /// Vocabulary size used as the wire-format dimension
    pub fn vocab_size(&self) -> usize {
        self.tokens.vocab_size()
    }

    /// Encode text into token counts
    pub fn encode(&self, text: &str) -> Result<SparseVector, EmbeddingError> {
        let mut ids = self.tokens.encode(text)?;
        ids.truncate(MAX_SPARSE_TOKENS);
        let sparse = SparseVector::from_token_ids(&ids, &self.tokens.sentinel_ids());
        tracing::debug!(non_zero = sparse.len(), "Sparse vector generated");
        Ok(sparse)
    }
}

impl std::fmt::Debug for SparseEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseEncoder")
            .field("vocab_size", &self.tokens.vocab_size())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
