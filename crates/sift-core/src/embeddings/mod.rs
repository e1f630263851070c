//! Embeddings Module
//!
//! Turns query text into the two signals hybrid retrieval fuses:
//! - Dense embeddings from a remote model service (Voyage AI)
//! - Sparse term-frequency vectors from a HuggingFace tokenizer
//! - The `{id:weight,...}/vocab_size` wire format understood by storage

mod dense;
mod sparse;
mod wire;

pub use dense::{
    cosine_distance, cosine_similarity, dot_product, DenseEncoder, DenseVector,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL,
};

#[cfg(feature = "remote-embeddings")]
pub use dense::VoyageEncoder;

pub use sparse::{HfTokenizer, SparseEncoder, SparseVector, TokenSource, MAX_SPARSE_TOKENS};

pub use wire::{format_sparse, parse_sparse};

/// Embedding error types
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    /// Failed to construct an encoder (missing credentials, bad client config)
    #[error("Encoder initialization failed: {0}")]
    ModelInit(String),
    /// Remote service call failed or returned an unusable response
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
    /// Tokenizer could not be loaded
    #[error("Tokenizer unavailable: {0}")]
    TokenizerUnavailable(String),
    /// Tokenizer failed on a specific input
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Malformed vector payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
