//! # Sift Core
//!
//! Hybrid document retrieval. A query is ranked against a document store by
//! two signals and, optionally, their fusion:
//!
//! - **Semantic**: dense contextualized embeddings (Voyage AI), cosine similarity
//! - **Statistical**: sparse term-frequency vectors over a fixed tokenizer
//!   vocabulary, negative inner product (lower is better)
//! - **Hybrid**: min-max normalized lexical relevance blended with semantic
//!   similarity through a tunable weight `alpha`
//!
//! Documents live in SQLite; the vector operators are registered as SQL
//! functions on every connection.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sift_core::{SearchConfig, SearchEngine, SearchMode, SearchRequest};
//!
//! let config = SearchConfig::from_env()?;
//! let engine = SearchEngine::from_config(&config)?;
//!
//! let request = SearchRequest::new(["cancer treatment"], SearchMode::Hybrid, 5, Some(0.7))?;
//! let result = engine.search(&request).await?;
//! for doc in &result.results {
//!     println!("{} {:.3}", doc.doc_id, doc.similarity);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary
//! - `remote-embeddings` (default): Voyage AI dense encoder over HTTPS

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod embeddings;
pub mod search;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{ConfigError, SearchConfig};

pub use embeddings::{
    format_sparse, parse_sparse, DenseEncoder, DenseVector, EmbeddingError, HfTokenizer,
    SparseEncoder, SparseVector, TokenSource,
};

#[cfg(feature = "remote-embeddings")]
#[cfg_attr(docsrs, doc(cfg(feature = "remote-embeddings")))]
pub use embeddings::VoyageEncoder;

pub use search::{
    EngineOptions, IndexError, RetrievedDocument, SearchEngine, SearchError, SearchMode,
    SearchParams, SearchRequest, SearchResult, Stage, ValidationError,
};

pub use storage::{DocumentRecord, Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        DenseEncoder, DocumentRecord, SearchConfig, SearchEngine, SearchError, SearchMode,
        SearchParams, SearchRequest, SearchResult, SparseEncoder, Storage,
    };
}
