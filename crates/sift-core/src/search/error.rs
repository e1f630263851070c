//! Search error taxonomy
//!
//! Every failure aborts the in-flight call and names the stage and mode it
//! happened in.

use std::fmt;

use super::request::{SearchMode, ValidationError};
use crate::config::ConfigError;
use crate::embeddings::EmbeddingError;
use crate::storage::StorageError;

/// Pipeline stage a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DenseEncoding,
    SparseEncoding,
    Storage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::DenseEncoding => "dense encoding",
            Stage::SparseEncoding => "sparse encoding",
            Stage::Storage => "storage query",
        })
    }
}

/// Coarse failure category, used for status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Encoding,
    Storage,
    Initialization,
}

/// Search error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Request rejected before any remote call
    #[error("Invalid search request: {0}")]
    Validation(#[from] ValidationError),

    /// Dense or sparse encoder failed
    #[error("{stage} failed during {mode} search: {source}")]
    Encoding {
        mode: SearchMode,
        stage: Stage,
        #[source]
        source: EmbeddingError,
    },

    /// Query execution or row mapping failed
    #[error("{} failed during {mode} search: {source}", Stage::Storage)]
    Storage {
        mode: SearchMode,
        #[source]
        source: StorageError,
    },

    /// A bounded stage did not finish in time
    #[error("{stage} timed out after {timeout_ms}ms during {mode} search")]
    Timeout {
        mode: SearchMode,
        stage: Stage,
        timeout_ms: u64,
    },

    /// Missing or unusable configuration at startup
    #[error("Initialization error: {0}")]
    Init(String),
}

impl SearchError {
    /// Category of this failure; a timeout belongs to the stage that timed out
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Validation(_) => ErrorKind::Validation,
            SearchError::Encoding { .. } => ErrorKind::Encoding,
            SearchError::Storage { .. } => ErrorKind::Storage,
            SearchError::Timeout { stage, .. } => match stage {
                Stage::Storage => ErrorKind::Storage,
                Stage::DenseEncoding | Stage::SparseEncoding => ErrorKind::Encoding,
            },
            SearchError::Init(_) => ErrorKind::Initialization,
        }
    }

    /// Stage of the failure, when it happened inside the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SearchError::Encoding { stage, .. } | SearchError::Timeout { stage, .. } => {
                Some(*stage)
            }
            SearchError::Storage { .. } => Some(Stage::Storage),
            SearchError::Validation(_) | SearchError::Init(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Timeout { .. })
    }
}

impl From<ConfigError> for SearchError {
    fn from(e: ConfigError) -> Self {
        SearchError::Init(e.to_string())
    }
}

/// Failure while encoding and storing one document
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Document '{doc_id}' rejected: {reason}")]
    InvalidDocument { doc_id: String, reason: String },

    #[error("{stage} failed for document '{doc_id}': {source}")]
    Encoding {
        doc_id: String,
        stage: Stage,
        #[source]
        source: EmbeddingError,
    },

    #[error("Dense encoding timed out after {timeout_ms}ms for document '{doc_id}'")]
    Timeout { doc_id: String, timeout_ms: u64 },

    #[error("Failed to store document '{doc_id}': {source}")]
    Storage {
        doc_id: String,
        #[source]
        source: StorageError,
    },
}
