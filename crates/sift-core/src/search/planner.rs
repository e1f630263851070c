//! Query Planner
//!
//! One `QueryPlan` variant per mode, built once per request from the encoded
//! query and executed against a scoped storage connection. Every statement is
//! parameterized; query text never reaches the SQL string.

use rusqlite::params;
use serde_json::Value;

use super::fusion::hybrid_fusion;
use super::request::{Retrieval, SearchMode};
use crate::embeddings::DenseVector;
use crate::storage::{RawRow, StorageConnection, StorageError};

/// Semantic ranking: `1 - cosine_distance`, descending
const SEMANTIC_SQL: &str = "
    SELECT d.*, (1.0 - cosine_distance(d.embedding, ?1)) AS similarity
    FROM documents d
    WHERE d.embedding IS NOT NULL
    ORDER BY similarity DESC, d.doc_id ASC
    LIMIT ?2";

/// Statistical ranking: negative inner product, ascending
const STATISTICAL_SQL: &str = "
    SELECT d.*, sparse_neg_inner_product(d.sparse, ?1) AS score
    FROM documents d
    WHERE d.sparse IS NOT NULL
    ORDER BY score ASC, d.doc_id ASC
    LIMIT ?2";

/// Hybrid branch 1: semantic candidate pool
const SEMANTIC_CANDIDATES_SQL: &str = "
    SELECT doc_id, (1.0 - cosine_distance(embedding, ?1)) AS score
    FROM documents
    WHERE embedding IS NOT NULL
    ORDER BY score DESC, doc_id ASC
    LIMIT ?2";

/// Hybrid branch 2: lexical candidate pool (raw distances)
const LEXICAL_CANDIDATES_SQL: &str = "
    SELECT doc_id, sparse_neg_inner_product(sparse, ?1) AS score
    FROM documents
    WHERE sparse IS NOT NULL
    ORDER BY score ASC, doc_id ASC
    LIMIT ?2";

/// Column carrying the fused score on hybrid rows
pub const FINAL_SCORE_COLUMN: &str = "final_score";

/// SQLite reads a negative LIMIT as unbounded, so saturate instead of wrapping
fn sql_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// A mode-specific retrieval, ready to execute
#[derive(Debug, Clone)]
pub enum QueryPlan {
    Semantic {
        query: DenseVector,
        top_k: usize,
    },
    Statistical {
        /// Serialized sparse query
        query: String,
        top_k: usize,
    },
    Hybrid {
        dense: DenseVector,
        sparse: String,
        alpha: f64,
        top_k: usize,
        candidate_pool: usize,
    },
}

impl QueryPlan {
    /// Select the plan for a retrieval mode
    pub fn new(
        retrieval: Retrieval,
        top_k: usize,
        dense: DenseVector,
        sparse: String,
        candidate_pool: usize,
    ) -> Self {
        match retrieval {
            Retrieval::Semantic => QueryPlan::Semantic {
                query: dense,
                top_k,
            },
            Retrieval::Statistical => QueryPlan::Statistical {
                query: sparse,
                top_k,
            },
            Retrieval::Hybrid { alpha } => QueryPlan::Hybrid {
                dense,
                sparse,
                alpha,
                top_k,
                candidate_pool,
            },
        }
    }

    pub fn mode(&self) -> SearchMode {
        match self {
            QueryPlan::Semantic { .. } => SearchMode::Semantic,
            QueryPlan::Statistical { .. } => SearchMode::Statistical,
            QueryPlan::Hybrid { .. } => SearchMode::Hybrid,
        }
    }

    /// Run the plan; rows come back best first
    pub fn execute(&self, conn: &StorageConnection) -> Result<Vec<RawRow>, StorageError> {
        match self {
            QueryPlan::Semantic { query, top_k } => {
                conn.query_rows(SEMANTIC_SQL, params![query.to_bytes(), sql_limit(*top_k)])
            }
            QueryPlan::Statistical { query, top_k } => {
                conn.query_rows(STATISTICAL_SQL, params![query, sql_limit(*top_k)])
            }
            QueryPlan::Hybrid {
                dense,
                sparse,
                alpha,
                top_k,
                candidate_pool,
            } => {
                let pool = sql_limit(*candidate_pool);
                let semantic =
                    conn.query_scores(SEMANTIC_CANDIDATES_SQL, params![dense.to_bytes(), pool])?;
                let lexical = conn.query_scores(LEXICAL_CANDIDATES_SQL, params![sparse, pool])?;

                tracing::debug!(
                    semantic = semantic.len(),
                    lexical = lexical.len(),
                    alpha,
                    "Hybrid candidate pools retrieved"
                );

                let mut fused = hybrid_fusion(&semantic, &lexical, *alpha);
                fused.truncate(*top_k);

                join_fused_rows(conn, fused)
            }
        }
    }
}

/// Attach fused scores to full document rows, keeping fused order
fn join_fused_rows(
    conn: &StorageConnection,
    fused: Vec<(String, f64)>,
) -> Result<Vec<RawRow>, StorageError> {
    let ids: Vec<String> = fused.iter().map(|(id, _)| id.clone()).collect();
    let mut rows = conn.fetch_documents(&ids)?;

    let mut ordered = Vec::with_capacity(fused.len());
    for (id, score) in fused {
        let position = rows
            .iter()
            .position(|row| row.get("doc_id").and_then(Value::as_str) == Some(id.as_str()));
        // a row deleted between the candidate and fetch queries is skipped
        if let Some(position) = position {
            let mut row = rows.swap_remove(position);
            row.push(FINAL_SCORE_COLUMN, Value::from(score));
            ordered.push(row);
        }
    }

    Ok(ordered)
}

// ============================================================================
// TESTS
// ============================================================================
