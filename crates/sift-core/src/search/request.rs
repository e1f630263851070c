//! Search requests and their validation
//!
//! `SearchParams` is the loose wire shape; `SearchRequest` is the validated,
//! immutable value the engine accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest accepted `top_k`
pub const MIN_TOP_K: i64 = 1;

/// Largest accepted `top_k`
pub const MAX_TOP_K: i64 = 20;

/// `top_k` when the caller omits it
pub const DEFAULT_TOP_K: i64 = 5;

/// `alpha` when the caller omits it
pub const DEFAULT_ALPHA: f64 = 0.5;

// ============================================================================
// MODE
// ============================================================================

/// Which signal ranks the results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Dense cosine similarity, descending
    #[default]
    Semantic,
    /// Sparse negative inner product, ascending
    Statistical,
    /// Weighted fusion of both
    Hybrid,
}

impl SearchMode {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Semantic => "semantic",
            SearchMode::Statistical => "statistical",
            SearchMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(SearchMode::Semantic),
            "statistical" => Ok(SearchMode::Statistical),
            "hybrid" => Ok(SearchMode::Hybrid),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

/// A mode with the parameters it needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Retrieval {
    Semantic,
    Statistical,
    Hybrid { alpha: f64 },
}

impl Retrieval {
    /// The bare mode
    pub fn mode(&self) -> SearchMode {
        match self {
            Retrieval::Semantic => SearchMode::Semantic,
            Retrieval::Statistical => SearchMode::Statistical,
            Retrieval::Hybrid { .. } => SearchMode::Hybrid,
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Why a request was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one non-empty query is required")]
    EmptyQueries,
    #[error("alpha is required for hybrid search")]
    MissingAlpha,
    #[error("top_k must be between {MIN_TOP_K} and {MAX_TOP_K}, got {0}")]
    TopKOutOfRange(i64),
    #[error("alpha must be between 0.0 and 1.0, got {0}")]
    AlphaOutOfRange(f64),
    #[error("unknown search type '{0}', expected semantic, statistical or hybrid")]
    UnknownMode(String),
}

// ============================================================================
// WIRE SHAPE
// ============================================================================

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

fn default_alpha() -> Option<f64> {
    Some(DEFAULT_ALPHA)
}

/// Request body as received over HTTP / CLI
///
/// An omitted `alpha` defaults to 0.5; an explicit `null` stays `None` and is
/// rejected for hybrid searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub queries: Vec<String>,
    #[serde(default)]
    pub search_type: SearchMode,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_alpha")]
    pub alpha: Option<f64>,
}

impl SearchParams {
    /// Params with defaults for everything but the queries
    pub fn new(queries: Vec<String>) -> Self {
        Self {
            queries,
            search_type: SearchMode::default(),
            top_k: DEFAULT_TOP_K,
            alpha: default_alpha(),
        }
    }
}

// ============================================================================
// VALIDATED REQUEST
// ============================================================================

/// A validated search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    queries: Vec<String>,
    retrieval: Retrieval,
    top_k: usize,
    alpha: Option<f64>,
}

impl SearchRequest {
    /// Validate and build a request
    ///
    /// Queries are trimmed and blank ones dropped; at least one must remain.
    pub fn new<I, S>(
        queries: I,
        mode: SearchMode,
        top_k: i64,
        alpha: Option<f64>,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries: Vec<String> = queries
            .into_iter()
            .map(|q| q.as_ref().trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if queries.is_empty() {
            return Err(ValidationError::EmptyQueries);
        }

        if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
            return Err(ValidationError::TopKOutOfRange(top_k));
        }

        if let Some(a) = alpha {
            // also rejects NaN
            if !(0.0..=1.0).contains(&a) {
                return Err(ValidationError::AlphaOutOfRange(a));
            }
        }

        let retrieval = match mode {
            SearchMode::Semantic => Retrieval::Semantic,
            SearchMode::Statistical => Retrieval::Statistical,
            SearchMode::Hybrid => Retrieval::Hybrid {
                alpha: alpha.ok_or(ValidationError::MissingAlpha)?,
            },
        };

        Ok(Self {
            queries,
            retrieval,
            top_k: top_k as usize,
            alpha,
        })
    }

    /// Trimmed, non-empty queries in caller order
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Mode and its parameters
    pub fn retrieval(&self) -> Retrieval {
        self.retrieval
    }

    pub fn mode(&self) -> SearchMode {
        self.retrieval.mode()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Alpha as supplied (ignored outside hybrid mode)
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// All queries joined with single spaces
    pub fn combined_query(&self) -> String {
        self.queries.join(" ")
    }
}

impl TryFrom<SearchParams> for SearchRequest {
    type Error = ValidationError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        SearchRequest::new(params.queries, params.search_type, params.top_k, params.alpha)
    }
}

// ============================================================================
// TESTS
// ============================================================================
