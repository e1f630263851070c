//! Result Normalizer
//!
//! Maps raw storage rows onto one schema: a document id, one relevance field
//! named `similarity`, and the remaining metadata columns. Vector payload
//! columns never leave this module.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{RawRow, StorageError};

/// Column holding the document id
pub const ID_COLUMN: &str = "doc_id";

/// Unified relevance field
pub const SIMILARITY_FIELD: &str = "similarity";

/// Score columns by priority; the first present one becomes `similarity`
const SCORE_COLUMNS: [&str; 3] = ["final_score", SIMILARITY_FIELD, "score"];

/// Vector payloads dropped from every row
pub const PAYLOAD_COLUMNS: [&str; 2] = ["embedding", "sparse"];

/// Text columns holding serialized JSON
const JSON_COLUMNS: [&str; 1] = ["metadata"];

/// A ranked document as returned to callers
///
/// Serializes flat: `{"doc_id": .., "similarity": .., "title": .., ...}`.
/// `similarity` means cosine similarity (semantic), negative inner product
/// where lower is better (statistical), or the fused score (hybrid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub doc_id: String,
    pub similarity: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Terminal output of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<RetrievedDocument>,
    pub total_found: usize,
}

impl SearchResult {
    /// Wrap normalized documents; `total_found` is their count
    pub fn new(results: Vec<RetrievedDocument>) -> Self {
        let total_found = results.len();
        Self {
            results,
            total_found,
        }
    }
}

fn schema_error(message: String) -> StorageError {
    StorageError::Schema(message)
}

/// Normalize one raw row
pub fn normalize_row(row: RawRow) -> Result<RetrievedDocument, StorageError> {
    let score_column = SCORE_COLUMNS
        .iter()
        .find(|column| row.get(column).is_some())
        .ok_or_else(|| {
            schema_error(format!(
                "no score column (expected one of {:?}) in columns {:?}",
                SCORE_COLUMNS,
                row.column_names().collect::<Vec<_>>()
            ))
        })?;

    let mut doc_id = None;
    let mut similarity = None;
    let mut fields = Map::new();

    for (name, value) in row.into_columns() {
        if name == *score_column {
            similarity = Some(value.as_f64().ok_or_else(|| {
                schema_error(format!("score column '{}' is not numeric: {}", name, value))
            })?);
        } else if name == ID_COLUMN {
            doc_id = Some(match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(schema_error(format!("'{}' has unusable value {}", ID_COLUMN, other)));
                }
            });
        } else if SCORE_COLUMNS.contains(&name.as_str())
            || PAYLOAD_COLUMNS.contains(&name.as_str())
        {
            continue;
        } else if JSON_COLUMNS.contains(&name.as_str()) {
            let parsed = match value {
                Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
                other => other,
            };
            fields.insert(name, parsed);
        } else {
            fields.insert(name, value);
        }
    }

    let doc_id = doc_id.ok_or_else(|| schema_error(format!("missing '{}' column", ID_COLUMN)))?;
    let similarity = similarity
        .ok_or_else(|| schema_error(format!("missing '{}' column", score_column)))?;

    Ok(RetrievedDocument {
        doc_id,
        similarity,
        fields,
    })
}

/// Normalize rows, keeping their order
pub fn normalize_rows(rows: Vec<RawRow>) -> Result<Vec<RetrievedDocument>, StorageError> {
    rows.into_iter().map(normalize_row).collect()
}

// ============================================================================
// TESTS
// ============================================================================
