//! Search Module
//!
//! Hybrid retrieval over the document store:
//! - Validated requests (mode, top_k, alpha)
//! - Mode-specific query plans (semantic, statistical, hybrid)
//! - Min-max normalized weighted fusion for hybrid mode
//! - Row normalization onto a single `similarity` field

mod engine;
mod error;
mod fusion;
mod planner;
mod request;
mod results;

pub use engine::{EngineOptions, SearchEngine};

pub use error::{ErrorKind, IndexError, SearchError, Stage};

pub use fusion::{
    hybrid_fusion, lexical_relevance, min_max_normalize, sort_by_score_desc, weighted_fusion,
    DEFAULT_CANDIDATE_POOL,
};

pub use planner::{QueryPlan, FINAL_SCORE_COLUMN};

pub use request::{
    Retrieval, SearchMode, SearchParams, SearchRequest, ValidationError, DEFAULT_ALPHA,
    DEFAULT_TOP_K, MAX_TOP_K, MIN_TOP_K,
};

pub use results::{
    normalize_row, normalize_rows, RetrievedDocument, SearchResult, ID_COLUMN, PAYLOAD_COLUMNS,
    SIMILARITY_FIELD,
};
